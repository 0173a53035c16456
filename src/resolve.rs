use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Error;
use crate::paper::Paper;

/// Filename index over one folder of PDFs.
///
/// The folder is scanned once up front; matching records against it is
/// then a plain map lookup. Lookups are exact, the index keeps filenames
/// as they appear on disk.
#[derive(Debug, Default)]
pub struct FileIndex {
    by_name: HashMap<String, PathBuf>,
}

impl FileIndex {
    /// Indexes every file directly inside `dir` whose name ends in
    /// `.pdf`, compared case-insensitively. Subdirectories are not
    /// descended into.
    pub fn scan_dir<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let mut by_name = HashMap::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if name.to_ascii_lowercase().ends_with(".pdf") {
                by_name.insert(name, entry.path());
            }
        }
        log::debug!("indexed {} PDF files", by_name.len());
        Ok(FileIndex { by_name })
    }

    pub fn get(&self, file_name: &str) -> Option<&Path> {
        self.by_name.get(file_name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Replaces each record's `file_name` with the full path of its PDF, or
/// clears it when the folder holds no match.
pub fn attach_files(papers: Vec<Paper>, index: &FileIndex) -> Vec<Paper> {
    attach_files_with_progress(papers, index, |_, _| {})
}

/// Like [`attach_files`], reporting `(done, total)` after each record so
/// a frontend can show progress over a large shelf.
pub fn attach_files_with_progress<F>(
    papers: Vec<Paper>,
    index: &FileIndex,
    mut progress: F,
) -> Vec<Paper>
where
    F: FnMut(usize, usize),
{
    let total = papers.len();
    papers
        .into_iter()
        .enumerate()
        .map(|(done, paper)| {
            let resolved = if paper.file_name.is_empty() {
                String::new()
            } else {
                match index.get(&paper.file_name) {
                    Some(path) => path.display().to_string(),
                    None => {
                        log::debug!("no PDF on disk named {:?}", paper.file_name);
                        String::new()
                    }
                }
            };
            progress(done + 1, total);
            Paper {
                file_name: resolved,
                ..paper
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, file_name: &str) -> Paper {
        Paper {
            id: id.to_owned(),
            title: "T".to_owned(),
            authors: vec![],
            year: 0,
            file_name: file_name.to_owned(),
            folder_token: "shelf".to_owned(),
        }
    }

    fn pdf_folder() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("smith2020.pdf"), b"%PDF-1.4").unwrap();
        fs::write(dir.path().join("UPPER.PDF"), b"%PDF-1.4").unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a pdf").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.pdf"), b"%PDF-1.4").unwrap();
        dir
    }

    #[test]
    fn test_scan_keeps_only_top_level_pdfs() {
        let dir = pdf_folder();
        let index = FileIndex::scan_dir(dir.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.get("smith2020.pdf").is_some());
        assert!(index.get("UPPER.PDF").is_some());
        assert!(index.get("notes.txt").is_none());
        assert!(index.get("deep.pdf").is_none());
    }

    #[test]
    fn test_attach_replaces_or_clears() {
        let dir = pdf_folder();
        let index = FileIndex::scan_dir(dir.path()).unwrap();
        let attached = attach_files(
            vec![
                paper("a", "smith2020.pdf"),
                paper("b", "gone.pdf"),
                paper("c", ""),
            ],
            &index,
        );
        assert_eq!(
            attached[0].file_name,
            dir.path().join("smith2020.pdf").display().to_string()
        );
        assert_eq!(attached[1].file_name, "");
        assert_eq!(attached[2].file_name, "");
        // Everything else is untouched.
        assert_eq!(attached[1].id, "b");
        assert_eq!(attached[1].folder_token, "shelf");
    }

    #[test]
    fn test_progress_reports_every_record() {
        let index = FileIndex::default();
        let mut seen = Vec::new();
        let attached = attach_files_with_progress(
            vec![paper("a", ""), paper("b", ""), paper("c", "x.pdf")],
            &index,
            |done, total| seen.push((done, total)),
        );
        assert_eq!(attached.len(), 3);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("never-created");
        assert!(FileIndex::scan_dir(&gone).is_err());
    }
}

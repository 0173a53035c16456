use std::fs;
use std::io::{BufRead, BufReader, Cursor};
use std::path;
use std::str;

use crate::errors::{Error, SkipStats};
use crate::fields;
use crate::paper::{self, Paper};
use crate::segment::Segments;

/// Parser reading a `.bib` source and allowing iteration over [`Paper`]
/// records.
pub struct Parser<R> {
    reader: R,
}

impl Parser<BufReader<fs::File>> {
    /// Use the file at `path` as source for the parsing process.
    pub fn from_file<P: AsRef<path::Path>>(path: P) -> Result<Self, Error> {
        let file = fs::File::open(path)?;
        Ok(Parser {
            reader: BufReader::new(file),
        })
    }
}

impl Parser<Cursor<String>> {
    /// Use an owned string as source for the parsing process.
    pub fn from_string(data: String) -> Result<Self, Error> {
        Ok(Parser {
            reader: Cursor::new(data),
        })
    }
}

impl<R: BufRead> Parser<R> {
    /// Use any buffered reader as source for the parsing process.
    pub fn from_reader(reader: R) -> Self {
        Parser { reader }
    }

    /// Consumes the parser into an iterator of records. Every record
    /// carries `folder_token` verbatim so a later resolution step knows
    /// which folder its filename is relative to.
    pub fn papers(self, folder_token: &str) -> Papers<R> {
        Papers {
            segments: Segments::new(self.reader),
            folder_token: folder_token.to_owned(),
            stats: SkipStats::default(),
        }
    }
}

impl str::FromStr for Parser<Cursor<String>> {
    type Err = Error;

    /// Use a borrowed string as source for the parsing process.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Parser::from_string(data.to_string())
    }
}

/// A stateful iterator yielding one [`Paper`] after another.
///
/// Entries that cannot become records are skipped, tallied and logged at
/// debug level; they never surface as items. The only `Err` item is a
/// failed read on the underlying source, after which iteration ends.
pub struct Papers<R> {
    segments: Segments<R>,
    folder_token: String,
    stats: SkipStats,
}

impl<R: BufRead> Papers<R> {
    /// Skip counters gathered so far. Final once the iterator is
    /// exhausted.
    pub fn skip_stats(&self) -> SkipStats {
        SkipStats {
            unterminated: self.segments.unterminated(),
            ..self.stats
        }
    }
}

impl<R: BufRead> Iterator for Papers<R> {
    type Item = Result<Paper, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = match self.segments.next()? {
                Ok(block) => block,
                Err(err) => return Some(Err(err)),
            };
            self.stats.blocks += 1;
            let reason = match fields::tokenize_entry(&block)
                .and_then(|entry| paper::build_paper(entry, &self.folder_token))
            {
                Ok(paper) => return Some(Ok(paper)),
                Err(reason) => reason,
            };
            log::debug!("skipping entry ({reason}): {block:.60}");
            self.stats.record(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error;
    use std::io::{self, Write};
    use std::str::FromStr;

    #[test]
    fn test_tolkien() -> Result<(), Box<dyn error::Error>> {
        let p = Parser::from_str(
            "@book{tolkien1937,\n  author = {J. R. R. Tolkien},\n  title = {The Hobbit},\n  year = {1937}\n}",
        )?;
        let mut count = 0;
        for record in p.papers("shelf") {
            let paper = record?;
            assert_eq!(paper.id, "tolkien1937");
            assert_eq!(paper.title, "The Hobbit");
            assert_eq!(paper.authors, vec!["J. R. R. Tolkien"]);
            assert_eq!(paper.year, 1937);
            assert_eq!(paper.folder_token, "shelf");
            count += 1;
        }
        assert_eq!(count, 1);
        Ok(())
    }

    #[test]
    fn test_taocp() -> Result<(), Box<dyn error::Error>> {
        let src = r#"@book{DBLP:books/lib/Knuth97,
  author    = {Donald Ervin Knuth},
  title     = {The art of computer programming, Volume {I:} Fundamental Algorithms,
               3rd Edition},
  publisher = {Addison-Wesley},
  year      = {1997},
  url       = {https://www.worldcat.org/oclc/312910844},
  isbn      = {0201896834},
  timestamp = {Fri, 17 Jul 2020 16:12:39 +0200},
  biburl    = {https://dblp.org/rec/books/lib/Knuth97.bib},
  bibsource = {{dblp computer science bibliography}, https://dblp.org}
}"#;
        let mut papers = Parser::from_str(src)?.papers("shelf");
        let paper = papers.next().unwrap()?;
        assert_eq!(paper.id, "DBLP:books/lib/Knuth97");
        assert_eq!(
            paper.title,
            "The art of computer programming, Volume I: Fundamental Algorithms, 3rd Edition"
        );
        assert_eq!(paper.authors, vec!["Donald Ervin Knuth"]);
        assert_eq!(paper.year, 1997);
        assert!(papers.next().is_none());
        Ok(())
    }

    #[test]
    fn test_empty_input_yields_nothing() -> Result<(), Box<dyn error::Error>> {
        let mut papers = Parser::from_string(String::new())?.papers("shelf");
        assert!(papers.next().is_none());
        assert_eq!(papers.skip_stats().skipped(), 0);
        Ok(())
    }

    #[test]
    fn test_prose_only_input_yields_nothing() -> Result<(), Box<dyn error::Error>> {
        let mut papers =
            Parser::from_str("A reading list.\nNothing here is an entry.\n")?.papers("shelf");
        assert!(papers.next().is_none());
        assert_eq!(papers.skip_stats().skipped(), 0);
        Ok(())
    }

    #[test]
    fn test_records_keep_source_order() -> Result<(), Box<dyn error::Error>> {
        let src = "@misc{zulu,\ntitle={Z}\n}\n@misc{alpha,\ntitle={A}\n}\n@misc{mike,\ntitle={M}\n}";
        let ids: Vec<String> = Parser::from_str(src)?
            .papers("shelf")
            .map(|record| record.map(|paper| paper.id))
            .collect::<Result<_, _>>()?;
        assert_eq!(ids, vec!["zulu", "alpha", "mike"]);
        Ok(())
    }

    #[test]
    fn test_broken_entries_are_counted_not_returned() -> Result<(), Box<dyn error::Error>> {
        let src = "@garbage without braces\n@article{ok,\ntitle = {Fine}\n}\n@broken{x,\ntitle = {never";
        let mut papers = Parser::from_str(src)?.papers("shelf");
        let titles: Vec<String> = (&mut papers)
            .map(|record| record.map(|paper| paper.title))
            .collect::<Result<_, _>>()?;
        assert_eq!(titles, vec!["Fine"]);
        let stats = papers.skip_stats();
        assert_eq!(stats.blocks, 2);
        assert_eq!(stats.malformed_header, 1);
        assert_eq!(stats.unterminated, 1);
        assert_eq!(stats.skipped(), 2);
        Ok(())
    }

    #[test]
    fn test_read_failure_surfaces_as_error() {
        struct BrokenReader {
            fed: bool,
        }

        impl io::Read for BrokenReader {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.fed {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe burst"));
                }
                self.fed = true;
                let data = b"@article{a,\n";
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
        }

        let reader = BufReader::new(BrokenReader { fed: false });
        let mut papers = Parser::from_reader(reader).papers("shelf");
        match papers.next() {
            Some(Err(Error::Io(_))) => {}
            other => panic!("expected a read error, got {other:?}"),
        }
        assert!(papers.next().is_none());
    }

    #[test]
    fn test_from_file() -> Result<(), Box<dyn error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "@misc{{disk,\ntitle = {{On Disk}}\n}}")?;
        let papers: Vec<Paper> = Parser::from_file(file.path())?
            .papers("shelf")
            .collect::<Result<_, _>>()?;
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "On Disk");
        Ok(())
    }
}

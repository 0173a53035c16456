use crate::paper::Paper;

/// Returns true when `paper` matches the search `query`.
///
/// Matching is case-insensitive over the title, every author and the
/// year's decimal form. A blank query matches everything.
pub fn matches_query(paper: &Paper, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    paper.title.to_lowercase().contains(&needle)
        || paper
            .authors
            .iter()
            .any(|author| author.to_lowercase().contains(&needle))
        || paper.year.to_string().contains(&needle)
}

/// Keeps the records matching `query`, preserving their order.
pub fn filter_papers<'p>(papers: &'p [Paper], query: &str) -> Vec<&'p Paper> {
    papers
        .iter()
        .filter(|paper| matches_query(paper, query))
        .collect()
}

/// Sorts records the way the shelf lists them: by title, ignoring case.
pub fn sort_by_title(papers: &mut [Paper]) {
    papers.sort_by_key(|paper| paper.title.to_lowercase());
}

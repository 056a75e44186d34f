//! crates/manga_reader_core/src/navigation.rs
//!
//! Chapter and page navigation for the reader.
//!
//! Every operation here is a pure function of a `ChapterList` and a client-held
//! `ReaderPosition`. Nothing fails: a chapter missing from the filtered list leaves the
//! position unresolved, and a move with nowhere to go reports `Step::Stayed`.

use crate::domain::{Chapter, LanguageFilter};

//=========================================================================================
// ChapterList
//=========================================================================================

/// The language-filtered, ordered view of a work's chapters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterList {
    chapters: Vec<Chapter>,
}

impl ChapterList {
    /// Filters `catalog` down to `filter` and orders it by chapter number.
    ///
    /// Ties on the number are broken by the language's position in the selection,
    /// then by publish time, then by identifier so the order is total.
    pub fn build(catalog: &[Chapter], filter: &LanguageFilter) -> Self {
        let mut chapters: Vec<Chapter> = catalog
            .iter()
            .filter(|chapter| filter.allows(&chapter.language))
            .cloned()
            .collect();

        chapters.sort_by(|a, b| {
            a.number
                .cmp(&b.number)
                .then_with(|| filter.preference(&a.language).cmp(&filter.preference(&b.language)))
                .then_with(|| a.published_at.cmp(&b.published_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        Self { chapters }
    }

    /// Index of the chapter with `chapter_id`, if it survived the filter.
    pub fn locate(&self, chapter_id: &str) -> Option<usize> {
        self.chapters.iter().position(|chapter| chapter.id == chapter_id)
    }

    pub fn get(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chapter> {
        self.chapters.iter()
    }

    pub fn into_chapters(self) -> Vec<Chapter> {
        self.chapters
    }
}

//=========================================================================================
// Reader position
//=========================================================================================

/// How pages of a chapter are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Single,
    Double,
    /// All pages render at once; the page index is only a scroll hint.
    Continuous,
}

impl LayoutMode {
    fn page_step(&self) -> usize {
        match self {
            LayoutMode::Single => 1,
            LayoutMode::Double => 2,
            LayoutMode::Continuous => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// What a navigation request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing to move to.
    Stayed,
    /// Moved within the current chapter.
    TurnedPage,
    /// Moved into another chapter of the list.
    EnteredChapter,
}

/// Where a reading session currently is. Ephemeral and client-held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderPosition {
    /// Index into the filtered `ChapterList`, `None` when the chapter is not in it.
    pub chapter_index: Option<usize>,
    pub page_index: usize,
    pub page_count: usize,
    pub layout: LayoutMode,
}

/// The outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub position: ReaderPosition,
    pub step: Step,
}

/// Identifiers of the neighbouring chapters of a position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterLinks {
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl ReaderPosition {
    /// Opens `chapter_id` at its first page.
    ///
    /// The page count comes from the list; an unresolved chapter starts with zero pages
    /// until the caller supplies one with [`ReaderPosition::with_page_count`].
    pub fn open(list: &ChapterList, chapter_id: &str, layout: LayoutMode) -> Self {
        let chapter_index = list.locate(chapter_id);
        let page_count = chapter_index
            .and_then(|index| list.get(index))
            .map_or(0, |chapter| chapter.page_count);

        Self {
            chapter_index,
            page_index: 0,
            page_count,
            layout,
        }
    }

    /// Overrides the page count, e.g. with the number of images actually served.
    pub fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = page_count;
        self.page_index = clamp_page(self.page_index, page_count);
        self
    }

    pub fn with_page(mut self, page_index: usize) -> Self {
        self.page_index = clamp_page(page_index, self.page_count);
        self
    }

    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.chapter_index.is_some()
    }

    pub fn chapter<'a>(&self, list: &'a ChapterList) -> Option<&'a Chapter> {
        self.chapter_index.and_then(|index| list.get(index))
    }

    pub fn links(&self, list: &ChapterList) -> ChapterLinks {
        let Some(index) = self.chapter_index else {
            return ChapterLinks::default();
        };
        ChapterLinks {
            previous: index
                .checked_sub(1)
                .and_then(|prev| list.get(prev))
                .map(|chapter| chapter.id.clone()),
            next: list.get(index + 1).map(|chapter| chapter.id.clone()),
        }
    }

    pub fn navigate(&self, list: &ChapterList, direction: Direction) -> Navigation {
        match direction {
            Direction::Forward => self.advance(list),
            Direction::Backward => self.retreat(list),
        }
    }

    /// Moves one step forward: the next page (or pair of pages), otherwise the first
    /// page of the next chapter. In continuous layout only the chapter move applies.
    pub fn advance(&self, list: &ChapterList) -> Navigation {
        let step = self.layout.page_step();
        if step == 0 {
            return self.next_chapter(list);
        }

        match self
            .page_index
            .checked_add(step)
            .filter(|target| *target < self.page_count)
        {
            Some(target) => self.turn_to(target),
            None => self.next_chapter(list),
        }
    }

    /// Moves one step back: the previous page (or pair), otherwise the last page of
    /// the previous chapter. In continuous layout only the chapter move applies.
    ///
    /// In double layout the last page of an even-length chapter is odd, so the spreads
    /// shown while paging back from it start on odd indices.
    pub fn retreat(&self, list: &ChapterList) -> Navigation {
        let step = self.layout.page_step();
        if step == 0 {
            return self.previous_chapter(list);
        }

        if self.page_index > 0 {
            return self.turn_to(self.page_index.saturating_sub(step));
        }

        match self.enter(list, self.chapter_index.and_then(|i| i.checked_sub(1))) {
            Some(mut position) => {
                position.page_index = position.page_count.saturating_sub(1);
                entered(position)
            }
            None => self.stay(),
        }
    }

    /// Sets the page directly, clamped to the chapter. Never crosses chapters.
    pub fn jump_to_page(&self, page_index: usize) -> Navigation {
        let position = self.with_page(page_index);
        let step = if position == *self {
            Step::Stayed
        } else {
            Step::TurnedPage
        };
        Navigation { position, step }
    }

    /// Enters the next chapter at its first page.
    pub fn next_chapter(&self, list: &ChapterList) -> Navigation {
        match self.enter(list, self.chapter_index.map(|i| i + 1)) {
            Some(position) => entered(position),
            None => self.stay(),
        }
    }

    /// Enters the previous chapter at its first page.
    pub fn previous_chapter(&self, list: &ChapterList) -> Navigation {
        match self.enter(list, self.chapter_index.and_then(|i| i.checked_sub(1))) {
            Some(position) => entered(position),
            None => self.stay(),
        }
    }

    /// Rebuilds the list for a new language selection and re-locates `chapter_id` in it.
    ///
    /// The list and the index are returned together so the index always points into the
    /// list it was computed from. A chapter with no translation in the new selection
    /// comes back unresolved; picking a fallback is left to the caller.
    pub fn switch_language(
        &self,
        catalog: &[Chapter],
        chapter_id: &str,
        filter: &LanguageFilter,
    ) -> (ChapterList, ReaderPosition) {
        let list = ChapterList::build(catalog, filter);
        let chapter_index = list.locate(chapter_id);
        let page_count = chapter_index
            .and_then(|index| list.get(index))
            .map_or(self.page_count, |chapter| chapter.page_count);

        let position = ReaderPosition {
            chapter_index,
            page_index: clamp_page(self.page_index, page_count),
            page_count,
            layout: self.layout,
        };
        (list, position)
    }

    fn enter(&self, list: &ChapterList, index: Option<usize>) -> Option<ReaderPosition> {
        // Unresolved positions have no neighbours.
        self.chapter_index?;
        let index = index?;
        let chapter = list.get(index)?;
        Some(ReaderPosition {
            chapter_index: Some(index),
            page_index: 0,
            page_count: chapter.page_count,
            layout: self.layout,
        })
    }

    fn turn_to(&self, page_index: usize) -> Navigation {
        Navigation {
            position: ReaderPosition {
                page_index,
                ..*self
            },
            step: Step::TurnedPage,
        }
    }

    fn stay(&self) -> Navigation {
        Navigation {
            position: *self,
            step: Step::Stayed,
        }
    }
}

fn entered(position: ReaderPosition) -> Navigation {
    Navigation {
        position,
        step: Step::EnteredChapter,
    }
}

fn clamp_page(page_index: usize, page_count: usize) -> usize {
    page_index.min(page_count.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChapterNumber;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn chapter(id: &str, number: &str, language: &str, pages: usize) -> Chapter {
        Chapter {
            id: id.to_string(),
            work_id: "work".to_string(),
            number: ChapterNumber::new(number),
            title: format!("Chapter {number}"),
            language: language.to_string(),
            page_count: pages,
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn list_of(page_counts: &[usize]) -> ChapterList {
        let catalog: Vec<Chapter> = page_counts
            .iter()
            .enumerate()
            .map(|(i, pages)| chapter(&format!("c{i}"), &(i + 1).to_string(), "en", *pages))
            .collect();
        ChapterList::build(&catalog, &LanguageFilter::All)
    }

    fn at(list: &ChapterList, index: usize, page: usize, layout: LayoutMode) -> ReaderPosition {
        ReaderPosition::open(list, &format!("c{index}"), layout).with_page(page)
    }

    #[test]
    fn build_filters_languages_and_orders_by_number() {
        let catalog = vec![
            chapter("b", "2", "en", 10),
            chapter("a-ar", "1", "ar", 10),
            chapter("a-en", "1", "en", 10),
            chapter("x", "1.5", "fr", 10),
        ];
        let filter = LanguageFilter::Only(vec!["en".to_string(), "ar".to_string()]);
        let list = ChapterList::build(&catalog, &filter);
        let ids: Vec<&str> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a-en", "a-ar", "b"]);
    }

    #[test]
    fn ties_on_language_break_by_publish_time() {
        let mut late = chapter("late", "3", "en", 5);
        late.published_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let early = chapter("early", "3", "en", 5);
        let list = ChapterList::build(&[late, early], &LanguageFilter::All);
        assert_eq!(list.get(0).map(|c| c.id.as_str()), Some("early"));
    }

    #[test]
    fn single_mode_turns_pages_then_crosses_chapters() {
        let list = list_of(&[3, 4]);
        let position = at(&list, 0, 1, LayoutMode::Single);

        let nav = position.advance(&list);
        assert_eq!(nav.step, Step::TurnedPage);
        assert_eq!(nav.position.page_index, 2);

        let nav = nav.position.advance(&list);
        assert_eq!(nav.step, Step::EnteredChapter);
        assert_eq!(nav.position.chapter_index, Some(1));
        assert_eq!(nav.position.page_index, 0);
        assert_eq!(nav.position.page_count, 4);
    }

    #[test]
    fn advancing_past_the_last_chapter_is_a_no_op() {
        let list = list_of(&[2]);
        let position = at(&list, 0, 1, LayoutMode::Single);
        let nav = position.advance(&list);
        assert_eq!(nav.step, Step::Stayed);
        assert_eq!(nav.position, position);
    }

    #[test]
    fn double_mode_shows_last_odd_page_alone() {
        let list = list_of(&[5, 2]);
        let mut position = at(&list, 0, 0, LayoutMode::Double);
        let mut seen = vec![position.page_index];
        loop {
            let nav = position.advance(&list);
            if nav.step != Step::TurnedPage {
                break;
            }
            position = nav.position;
            seen.push(position.page_index);
        }
        assert_eq!(seen, vec![0, 2, 4]);
        assert_eq!(position.page_index, 4);
    }

    #[test]
    fn advance_near_usize_max_crosses_instead_of_wrapping() {
        let list = list_of(&[3, 4]);
        let position = at(&list, 0, 0, LayoutMode::Double)
            .with_page_count(usize::MAX)
            .with_page(usize::MAX);
        assert_eq!(position.page_index, usize::MAX - 1);

        let nav = position.advance(&list);
        assert_eq!(nav.step, Step::EnteredChapter);
        assert_eq!(nav.position.chapter_index, Some(1));
        assert_eq!(nav.position.page_index, 0);

        let unresolved = ReaderPosition::open(&ChapterList::default(), "x", LayoutMode::Double)
            .with_page_count(usize::MAX)
            .with_page(usize::MAX);
        let nav = unresolved.advance(&ChapterList::default());
        assert_eq!(nav.step, Step::Stayed);
        assert_eq!(nav.position, unresolved);
    }

    #[test]
    fn double_mode_retreat_from_page_one_lands_on_first_page() {
        let list = list_of(&[6]);
        let nav = at(&list, 0, 1, LayoutMode::Double).retreat(&list);
        assert_eq!(nav.step, Step::TurnedPage);
        assert_eq!(nav.position.page_index, 0);
    }

    #[test]
    fn retreat_enters_previous_chapter_on_its_last_page() {
        let list = list_of(&[7, 3]);
        let nav = at(&list, 1, 0, LayoutMode::Single).retreat(&list);
        assert_eq!(nav.step, Step::EnteredChapter);
        assert_eq!(nav.position.chapter_index, Some(0));
        assert_eq!(nav.position.page_index, 6);
    }

    #[test]
    fn continuous_mode_only_moves_between_chapters() {
        let list = list_of(&[20, 30]);
        let position = at(&list, 0, 5, LayoutMode::Continuous);

        let forward = position.advance(&list);
        assert_eq!(forward.step, Step::EnteredChapter);
        assert_eq!(forward.position.chapter_index, Some(1));
        assert_eq!(forward.position.page_index, 0);

        let back = forward.position.retreat(&list);
        assert_eq!(back.step, Step::EnteredChapter);
        assert_eq!(back.position.chapter_index, Some(0));
        assert_eq!(back.position.page_index, 0);
    }

    #[test]
    fn jump_to_page_clamps_without_crossing() {
        let list = list_of(&[4, 4]);
        let position = at(&list, 0, 0, LayoutMode::Single);
        let nav = position.jump_to_page(99);
        assert_eq!(nav.step, Step::TurnedPage);
        assert_eq!(nav.position.chapter_index, Some(0));
        assert_eq!(nav.position.page_index, 3);
        assert_eq!(nav.position.jump_to_page(3).step, Step::Stayed);
    }

    #[test]
    fn unresolved_position_pages_but_never_crosses() {
        let list = list_of(&[3, 3]);
        let position = ReaderPosition::open(&list, "missing", LayoutMode::Single).with_page_count(2);
        assert!(!position.is_resolved());
        assert_eq!(position.links(&list), ChapterLinks::default());

        let nav = position.advance(&list);
        assert_eq!(nav.step, Step::TurnedPage);
        assert_eq!(nav.position.page_index, 1);

        let nav = nav.position.advance(&list);
        assert_eq!(nav.step, Step::Stayed);
        assert_eq!(position.retreat(&list).step, Step::Stayed);
    }

    #[test]
    fn links_point_at_neighbours() {
        let list = list_of(&[1, 1, 1]);
        let links = at(&list, 1, 0, LayoutMode::Single).links(&list);
        assert_eq!(links.previous.as_deref(), Some("c0"));
        assert_eq!(links.next.as_deref(), Some("c2"));
        let first = at(&list, 0, 0, LayoutMode::Single).links(&list);
        assert_eq!(first.previous, None);
    }

    #[test]
    fn switching_to_a_language_without_the_chapter_unresolves() {
        let catalog = vec![
            chapter("en-1", "1", "en", 10),
            chapter("en-2", "2", "en", 10),
            chapter("ar-1", "1", "ar", 8),
        ];
        let english = LanguageFilter::Only(vec!["en".to_string()]);
        let list = ChapterList::build(&catalog, &english);
        let position = ReaderPosition::open(&list, "en-2", LayoutMode::Single).with_page(4);
        assert_eq!(position.chapter_index, Some(1));

        let arabic = LanguageFilter::Only(vec!["ar".to_string()]);
        let (new_list, moved) = position.switch_language(&catalog, "en-2", &arabic);
        assert_eq!(new_list.len(), 1);
        assert_eq!(moved.chapter_index, None);
        assert_eq!(moved.links(&new_list), ChapterLinks::default());
    }

    #[test]
    fn switching_to_all_languages_relocates_the_chapter() {
        let catalog = vec![
            chapter("en-1", "1", "en", 10),
            chapter("ar-1", "1", "ar", 8),
            chapter("en-2", "2", "en", 10),
        ];
        let english = LanguageFilter::Only(vec!["en".to_string()]);
        let list = ChapterList::build(&catalog, &english);
        let position = ReaderPosition::open(&list, "en-2", LayoutMode::Double).with_page(9);

        let (new_list, moved) = position.switch_language(&catalog, "en-2", &LanguageFilter::All);
        assert_eq!(new_list.get(moved.chapter_index.unwrap()).unwrap().id, "en-2");
        assert_eq!(moved.page_index, 9);
        assert_eq!(moved.layout, LayoutMode::Double);
    }

    fn page_counts() -> impl Strategy<Value = Vec<usize>> {
        proptest::collection::vec(1usize..40, 2..8)
    }

    proptest! {
        #[test]
        fn forward_from_last_page_enters_next_chapter(counts in page_counts(), pick in 0usize..8) {
            let list = list_of(&counts);
            let i = pick % (counts.len() - 1);
            let position = at(&list, i, counts[i] - 1, LayoutMode::Single);
            let nav = position.advance(&list);
            prop_assert_eq!(nav.position.chapter_index, Some(i + 1));
            prop_assert_eq!(nav.position.page_index, 0);
        }

        #[test]
        fn backward_from_first_page_enters_previous_last_page(counts in page_counts(), pick in 0usize..8) {
            let list = list_of(&counts);
            let i = 1 + pick % (counts.len() - 1);
            let nav = at(&list, i, 0, LayoutMode::Single).retreat(&list);
            prop_assert_eq!(nav.position.chapter_index, Some(i - 1));
            prop_assert_eq!(nav.position.page_index, counts[i - 1] - 1);
        }

        #[test]
        fn double_mode_never_leaves_the_chapter_range(counts in page_counts()) {
            let list = list_of(&counts);
            let mut position = at(&list, 0, 0, LayoutMode::Double);
            loop {
                let nav = position.advance(&list);
                if nav.step != Step::TurnedPage {
                    if counts[0] % 2 == 1 {
                        prop_assert_eq!(position.page_index, counts[0] - 1);
                    }
                    break;
                }
                prop_assert!(nav.position.page_index < nav.position.page_count);
                position = nav.position;
            }
        }

        #[test]
        fn navigation_is_pure(counts in page_counts(), page in 0usize..40, forward in any::<bool>()) {
            let list = list_of(&counts);
            let position = at(&list, 0, page, LayoutMode::Single);
            let direction = if forward { Direction::Forward } else { Direction::Backward };
            let first = position.navigate(&list, direction);
            let second = position.navigate(&list, direction);
            prop_assert_eq!(first, second);
        }
    }
}

//! Mapping of a book's pages onto display view items.
//!
//! A [`Layout`] expands an ordered page list into the sequence of
//! [`ViewItem`]s a page-turn host displays: regular pages, the two halves of
//! a split wide page, optional dual-page spreads, and exactly one
//! [`ViewItem::End`] sentinel.
//!
//! Storage order is spatial. For horizontal right-to-left books the
//! reading-order sequence is reversed and the sentinel sits at index 0, so
//! the first page is the right-most item and reading forward moves toward
//! lower indices. Every other direction stores items in reading order with
//! the sentinel last.
//!
//! Building a layout is pure: the same pages and options always produce the
//! same items. The page to view-item lookup is memoized at build time.
//!
//! # Examples
//!
//! ```rust
//! use shiori::layout::{Layout, LayoutOptions, PageHalf, ViewItem};
//! use shiori::types::{Page, ReadingDirection, SplitWidePageMode};
//!
//! let pages = vec![Page::new(1, 800, 1200), Page::new(2, 1600, 1200)];
//! let options = LayoutOptions {
//!     split_wide_page_mode: SplitWidePageMode::Auto,
//!     ..Default::default()
//! };
//! let layout = Layout::build(&pages, options);
//!
//! assert_eq!(
//!     layout.items(),
//!     &[
//!         ViewItem::Page(0),
//!         ViewItem::SplitHalf { page: 1, half: PageHalf::Left },
//!         ViewItem::SplitHalf { page: 1, half: PageHalf::Right },
//!         ViewItem::End,
//!     ]
//! );
//! assert_eq!(layout.item_for_page(1), 1);
//! assert_eq!(layout.item_for_page(2), layout.end_index());
//! ```

use crate::types::{Page, ReaderSettings, ReadingDirection, SplitWidePageMode};

/// Which half of a split wide page a view item shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageHalf {
    Left,
    Right,
}

impl PageHalf {
    pub fn opposite(self) -> Self {
        match self {
            PageHalf::Left => PageHalf::Right,
            PageHalf::Right => PageHalf::Left,
        }
    }
}

/// One unit of display in the page-turn host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewItem {
    /// A whole page.
    Page(usize),
    /// One half of a wide page.
    SplitHalf { page: usize, half: PageHalf },
    /// Two pages shown side by side, `first` in reading order.
    Dual { first: usize, second: usize },
    /// End-of-book sentinel.
    End,
}

impl ViewItem {
    /// The page this item represents for progress and index purposes.
    pub fn primary_page(&self) -> Option<usize> {
        match *self {
            ViewItem::Page(page) => Some(page),
            ViewItem::SplitHalf { page, .. } => Some(page),
            ViewItem::Dual { first, .. } => Some(first),
            ViewItem::End => None,
        }
    }

    /// Whether `page` is displayed by this item.
    pub fn contains_page(&self, page: usize) -> bool {
        match *self {
            ViewItem::Dual { first, second } => page == first || page == second,
            _ => self.primary_page() == Some(page),
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, ViewItem::End)
    }

    pub fn is_split(&self) -> bool {
        matches!(self, ViewItem::SplitHalf { .. })
    }

    fn pages(self) -> impl Iterator<Item = usize> {
        let (a, b) = match self {
            ViewItem::Dual { first, second } => (Some(first), Some(second)),
            other => (other.primary_page(), None),
        };
        a.into_iter().chain(b)
    }
}

/// The settings a layout depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    pub reading_direction: ReadingDirection,
    pub split_wide_page_mode: SplitWidePageMode,
    pub dual_page: bool,
    pub dual_page_no_cover: bool,
}

impl From<&ReaderSettings> for LayoutOptions {
    fn from(settings: &ReaderSettings) -> Self {
        Self {
            reading_direction: settings.reading_direction,
            split_wide_page_mode: settings.split_wide_page_mode,
            dual_page: settings.dual_page,
            dual_page_no_cover: settings.dual_page_no_cover,
        }
    }
}

/// Ordered view items derived from a page list.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    items: Vec<ViewItem>,
    options: LayoutOptions,
    page_count: usize,
    /// First view item, in reading order, showing each page.
    page_items: Vec<Option<usize>>,
}

impl Layout {
    /// Expands `pages` into view items.
    ///
    /// Never fails: an empty page list yields a layout holding only the
    /// [`ViewItem::End`] sentinel.
    pub fn build(pages: &[Page], options: LayoutOptions) -> Self {
        let direction = options.reading_direction;
        let split = options.split_wide_page_mode.is_enabled();
        let first_half = if options
            .split_wide_page_mode
            .effective_reading_direction(direction)
            .is_rtl()
        {
            PageHalf::Right
        } else {
            PageHalf::Left
        };
        let pair = options.dual_page && direction.is_horizontal();

        let mut items = Vec::with_capacity(pages.len() + 1);
        let mut index = 0;
        while index < pages.len() {
            if pages[index].is_wide() {
                if split {
                    items.push(ViewItem::SplitHalf {
                        page: index,
                        half: first_half,
                    });
                    items.push(ViewItem::SplitHalf {
                        page: index,
                        half: first_half.opposite(),
                    });
                } else {
                    items.push(ViewItem::Page(index));
                }
                index += 1;
                continue;
            }

            let cover_alone = index == 0 && !options.dual_page_no_cover;
            if pair && !cover_alone {
                if let Some(next) = pages.get(index + 1) {
                    if !next.is_wide() {
                        items.push(ViewItem::Dual {
                            first: index,
                            second: index + 1,
                        });
                        index += 2;
                        continue;
                    }
                }
            }

            items.push(ViewItem::Page(index));
            index += 1;
        }

        if direction.is_rtl() {
            items.reverse();
            items.insert(0, ViewItem::End);
        } else {
            items.push(ViewItem::End);
        }

        let mut layout = Self {
            items,
            options,
            page_count: pages.len(),
            page_items: vec![None; pages.len()],
        };
        layout.index_pages();
        layout
    }

    fn index_pages(&mut self) {
        let order: Vec<usize> = self.reading_order().collect();
        for item_index in order {
            let item = self.items[item_index];
            for page in item.pages() {
                if let Some(slot) = self.page_items.get_mut(page) {
                    if slot.is_none() {
                        *slot = Some(item_index);
                    }
                }
            }
        }
    }

    /// Storage indices in reading order, sentinel included.
    pub fn reading_order(&self) -> impl Iterator<Item = usize> + use<> {
        let len = self.items.len();
        let rtl = self.is_rtl();
        (0..len).map(move |step| if rtl { len - 1 - step } else { step })
    }

    pub fn items(&self) -> &[ViewItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false`: the sentinel is present even for an empty book.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ViewItem> {
        self.items.get(index).copied()
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    pub fn reading_direction(&self) -> ReadingDirection {
        self.options.reading_direction
    }

    pub fn is_rtl(&self) -> bool {
        self.options.reading_direction.is_rtl()
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn has_split_pages(&self) -> bool {
        self.items.iter().any(ViewItem::is_split)
    }

    /// Storage index of the [`ViewItem::End`] sentinel.
    pub fn end_index(&self) -> usize {
        if self.is_rtl() { 0 } else { self.items.len() - 1 }
    }

    pub fn is_end(&self, index: usize) -> bool {
        index == self.end_index()
    }

    /// First content item in reading order, `None` for an empty book.
    pub fn first_content_index(&self) -> Option<usize> {
        if self.page_count == 0 {
            return None;
        }
        Some(if self.is_rtl() { self.items.len() - 1 } else { 0 })
    }

    /// Last content item in reading order, `None` for an empty book.
    pub fn last_content_index(&self) -> Option<usize> {
        if self.page_count == 0 {
            return None;
        }
        Some(if self.is_rtl() { 1 } else { self.items.len() - 2 })
    }

    /// View item to show for `page`.
    ///
    /// Returns the first item in reading order displaying the page, the
    /// sentinel when `page` is past the last page, and the last content item
    /// if the page is somehow not represented.
    pub fn item_for_page(&self, page: usize) -> usize {
        if page >= self.page_count {
            return self.end_index();
        }
        self.page_items[page]
            .or_else(|| self.last_content_index())
            .unwrap_or_else(|| self.end_index())
    }

    /// Primary page of the item at `index`; `None` for the sentinel or an
    /// out-of-range index.
    pub fn page_for_item(&self, index: usize) -> Option<usize> {
        self.get(index)?.primary_page()
    }

    /// Position of `index` in reading order.
    pub fn reading_position(&self, index: usize) -> usize {
        if self.is_rtl() {
            self.items.len().saturating_sub(1).saturating_sub(index)
        } else {
            index
        }
    }

    /// `index + delta` when it lands inside the layout.
    pub fn offset(&self, index: usize, delta: isize) -> Option<usize> {
        let target = index.checked_add_signed(delta)?;
        (target < self.items.len()).then_some(target)
    }

    /// Next item in reading order.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        self.offset(index, self.reading_direction().forward_step())
    }

    /// Previous item in reading order.
    pub fn previous_index(&self, index: usize) -> Option<usize> {
        self.offset(index, -self.reading_direction().forward_step())
    }

    /// Label shown in the reader chrome for the item at `index`.
    ///
    /// ```rust
    /// use shiori::layout::{Layout, LayoutOptions};
    /// use shiori::types::Page;
    ///
    /// let pages: Vec<Page> = (1..=3).map(|n| Page::new(n, 800, 1200)).collect();
    /// let layout = Layout::build(&pages, LayoutOptions { dual_page: true, ..Default::default() });
    /// assert_eq!(layout.page_label(0), "1");
    /// assert_eq!(layout.page_label(1), "2-3");
    /// assert_eq!(layout.page_label(2), "END");
    /// ```
    pub fn page_label(&self, index: usize) -> String {
        match self.get(index) {
            Some(ViewItem::Page(page)) | Some(ViewItem::SplitHalf { page, .. }) => {
                (page + 1).to_string()
            }
            Some(ViewItem::Dual { first, second }) => format!("{}-{}", first + 1, second + 1),
            Some(ViewItem::End) => "END".to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portrait(count: usize) -> Vec<Page> {
        (1..=count).map(|n| Page::new(n, 800, 1200)).collect()
    }

    fn options(direction: ReadingDirection, split: SplitWidePageMode) -> LayoutOptions {
        LayoutOptions {
            reading_direction: direction,
            split_wide_page_mode: split,
            ..Default::default()
        }
    }

    #[test]
    fn empty_book_has_only_the_sentinel() {
        for direction in ReadingDirection::ALL {
            let layout = Layout::build(&[], options(direction, SplitWidePageMode::Auto));
            assert_eq!(layout.items(), &[ViewItem::End]);
            assert_eq!(layout.end_index(), 0);
            assert_eq!(layout.first_content_index(), None);
            assert_eq!(layout.item_for_page(0), 0);
        }
    }

    #[test]
    fn rtl_is_stored_spatially() {
        let layout = Layout::build(
            &portrait(3),
            options(ReadingDirection::Rtl, SplitWidePageMode::None),
        );
        assert_eq!(
            layout.items(),
            &[
                ViewItem::End,
                ViewItem::Page(2),
                ViewItem::Page(1),
                ViewItem::Page(0)
            ]
        );
        assert_eq!(layout.first_content_index(), Some(3));
        assert_eq!(layout.last_content_index(), Some(1));
        assert_eq!(layout.item_for_page(0), 3);
        assert_eq!(layout.next_index(3), Some(2));
        assert_eq!(layout.next_index(1), Some(0));
        assert_eq!(layout.previous_index(3), None);
        assert_eq!(layout.reading_position(3), 0);
    }

    #[test]
    fn split_halves_follow_effective_direction() {
        let pages = vec![Page::new(1, 2000, 1400)];

        let ltr = Layout::build(&pages, options(ReadingDirection::Ltr, SplitWidePageMode::Auto));
        assert_eq!(
            ltr.get(0),
            Some(ViewItem::SplitHalf {
                page: 0,
                half: PageHalf::Left
            })
        );

        // Right half is read first, and sits right of the left half spatially.
        let rtl = Layout::build(&pages, options(ReadingDirection::Rtl, SplitWidePageMode::Auto));
        assert_eq!(
            rtl.items(),
            &[
                ViewItem::End,
                ViewItem::SplitHalf {
                    page: 0,
                    half: PageHalf::Left
                },
                ViewItem::SplitHalf {
                    page: 0,
                    half: PageHalf::Right
                },
            ]
        );
        assert_eq!(rtl.item_for_page(0), 2);

        // An LTR override keeps the left half first even in an RTL book.
        let forced = Layout::build(&pages, options(ReadingDirection::Rtl, SplitWidePageMode::Ltr));
        assert_eq!(
            forced.get(forced.item_for_page(0)),
            Some(ViewItem::SplitHalf {
                page: 0,
                half: PageHalf::Left
            })
        );
    }

    #[test]
    fn split_disabled_keeps_wide_pages_whole() {
        let pages = vec![Page::new(1, 800, 1200), Page::new(2, 2000, 1200)];
        let layout = Layout::build(&pages, options(ReadingDirection::Ltr, SplitWidePageMode::None));
        assert_eq!(layout.len(), 3);
        assert!(!layout.has_split_pages());
    }

    #[test]
    fn dual_pages_keep_cover_and_wide_pages_alone() {
        let mut pages = portrait(6);
        pages[3] = Page::new(4, 2000, 1200);
        let layout = Layout::build(
            &pages,
            LayoutOptions {
                dual_page: true,
                ..Default::default()
            },
        );
        assert_eq!(
            layout.items(),
            &[
                ViewItem::Page(0),
                ViewItem::Dual {
                    first: 1,
                    second: 2
                },
                ViewItem::Page(3),
                ViewItem::Dual {
                    first: 4,
                    second: 5
                },
                ViewItem::End,
            ]
        );
        assert_eq!(layout.item_for_page(2), 1);
        assert_eq!(layout.page_label(3), "5-6");
    }

    #[test]
    fn dual_pages_without_cover_pair_from_the_start() {
        let layout = Layout::build(
            &portrait(3),
            LayoutOptions {
                dual_page: true,
                dual_page_no_cover: true,
                ..Default::default()
            },
        );
        assert_eq!(
            layout.items(),
            &[
                ViewItem::Dual {
                    first: 0,
                    second: 1
                },
                ViewItem::Page(2),
                ViewItem::End
            ]
        );
    }

    #[test]
    fn vertical_layouts_never_pair() {
        let layout = Layout::build(
            &portrait(4),
            LayoutOptions {
                reading_direction: ReadingDirection::Webtoon,
                dual_page: true,
                ..Default::default()
            },
        );
        assert_eq!(layout.len(), 5);
        assert!(layout.items()[..4].iter().all(|item| matches!(item, ViewItem::Page(_))));
    }

    #[test]
    fn out_of_range_lookups() {
        let layout = Layout::build(&portrait(2), LayoutOptions::default());
        assert_eq!(layout.item_for_page(99), 2);
        assert_eq!(layout.page_for_item(2), None);
        assert_eq!(layout.page_for_item(7), None);
        assert_eq!(layout.offset(0, -1), None);
        assert_eq!(layout.page_label(9), "");
    }
}

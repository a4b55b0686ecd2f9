//! Property tests for layout construction and navigation.

use proptest::prelude::*;

use shiori::prelude::*;

fn book(wide: &[bool]) -> Vec<Page> {
    wide.iter()
        .enumerate()
        .map(|(i, &wide)| Page::new(i + 1, if wide { 1600 } else { 800 }, 1200))
        .collect()
}

fn direction() -> impl Strategy<Value = ReadingDirection> {
    prop_oneof![
        Just(ReadingDirection::Ltr),
        Just(ReadingDirection::Rtl),
        Just(ReadingDirection::Vertical),
        Just(ReadingDirection::Webtoon),
    ]
}

fn split_mode() -> impl Strategy<Value = SplitWidePageMode> {
    prop_oneof![
        Just(SplitWidePageMode::None),
        Just(SplitWidePageMode::Auto),
        Just(SplitWidePageMode::Ltr),
        Just(SplitWidePageMode::Rtl),
    ]
}

fn options() -> impl Strategy<Value = LayoutOptions> {
    (direction(), split_mode(), any::<bool>(), any::<bool>()).prop_map(
        |(reading_direction, split_wide_page_mode, dual_page, dual_page_no_cover)| LayoutOptions {
            reading_direction,
            split_wide_page_mode,
            dual_page,
            dual_page_no_cover,
        },
    )
}

proptest! {
    #[test]
    fn prop_unsplit_layout_has_one_item_per_page(
        wide in prop::collection::vec(any::<bool>(), 0..40),
        direction in direction(),
    ) {
        let layout = Layout::build(
            &book(&wide),
            LayoutOptions { reading_direction: direction, ..Default::default() },
        );
        prop_assert_eq!(layout.len(), wide.len() + 1);
        prop_assert_eq!(layout.get(layout.end_index()), Some(ViewItem::End));
        prop_assert_eq!(layout.reading_order().last(), Some(layout.end_index()));
        prop_assert_eq!(layout.items().iter().filter(|item| item.is_end()).count(), 1);
    }

    #[test]
    fn prop_split_layout_adds_one_item_per_wide_page(
        wide in prop::collection::vec(any::<bool>(), 0..40),
        direction in direction(),
    ) {
        let layout = Layout::build(
            &book(&wide),
            LayoutOptions {
                reading_direction: direction,
                split_wide_page_mode: SplitWidePageMode::Auto,
                ..Default::default()
            },
        );
        let wide_count = wide.iter().filter(|&&w| w).count();
        prop_assert_eq!(layout.len(), wide.len() + wide_count + 1);
        prop_assert_eq!(layout.has_split_pages(), wide_count > 0);
    }

    #[test]
    fn prop_every_page_is_reachable(
        wide in prop::collection::vec(any::<bool>(), 1..30),
        options in options(),
    ) {
        let layout = Layout::build(&book(&wide), options);
        for page in 0..wide.len() {
            let item = layout.item_for_page(page);
            prop_assert!(!layout.is_end(item));
            prop_assert!(layout.get(item).is_some_and(|view| view.contains_page(page)));
        }
    }

    #[test]
    fn prop_jump_to_page_commits_that_page(
        wide in prop::collection::vec(any::<bool>(), 1..30),
        options in options(),
        pick in any::<prop::sample::Index>(),
    ) {
        let page = pick.index(wide.len());
        // Start on the sentinel so every content page is a real move.
        let mut navigator = Navigator::new(Layout::build(&book(&wide), options), wide.len());
        let request = navigator.jump_to_page(page).unwrap();
        let commit = navigator
            .on_transition_completed(request.item, true, Some(request.generation))
            .unwrap();
        prop_assert_eq!(commit.page, page);
        prop_assert!(!commit.completed);
        prop_assert_eq!(navigator.position(), ReaderPosition::Reading(page));
        prop_assert!(navigator.target().is_none());
    }

    #[test]
    fn prop_jump_past_last_page_reaches_end(
        wide in prop::collection::vec(any::<bool>(), 1..30),
        options in options(),
        past in 0usize..100,
    ) {
        let count = wide.len();
        let mut navigator = Navigator::new(Layout::build(&book(&wide), options), 0);
        let request = navigator.jump_to_page(count + past).unwrap();
        prop_assert!(navigator.layout().is_end(request.item));
        let commit = navigator
            .on_transition_completed(request.item, true, Some(request.generation))
            .unwrap();
        prop_assert!(commit.completed);
        prop_assert_eq!(commit.page, count - 1);
        prop_assert_eq!(navigator.position(), ReaderPosition::AtEnd);
    }

    #[test]
    fn prop_only_latest_jump_commits(
        wide in prop::collection::vec(any::<bool>(), 1..30),
        options in options(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
    ) {
        let mut navigator = Navigator::new(Layout::build(&book(&wide), options), wide.len());
        let requests: Vec<TransitionRequest> = picks
            .iter()
            .map(|pick| navigator.jump_to_page(pick.index(wide.len())).unwrap())
            .collect();
        let last_page = picks[picks.len() - 1].index(wide.len());

        let commits: Vec<Option<Commit>> = requests
            .iter()
            .map(|r| navigator.on_transition_completed(r.item, true, Some(r.generation)))
            .collect();
        for commit in &commits[..commits.len() - 1] {
            prop_assert!(commit.is_none());
        }
        prop_assert_eq!(commits[commits.len() - 1].map(|c| c.page), Some(last_page));

        // Late completions of superseded requests change nothing.
        for r in &requests[..requests.len() - 1] {
            prop_assert!(navigator.on_transition_completed(r.item, true, Some(r.generation)).is_none());
        }
        prop_assert_eq!(navigator.current_page(), last_page);
    }
}

/// Bounded log panel behaviour.
///
/// Exercises the capacity, ordering and eviction guarantees of
/// `LogPanel::push` across panel sizes and arrival patterns.
use botdash::panel::{CAPACITY, LogPanel};

fn lines(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("line{i}")).collect()
}

fn filled(n: usize) -> LogPanel {
    let mut panel = LogPanel::new(20);
    for line in lines(0..n) {
        panel.push(line);
    }
    panel
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

#[test]
fn count_is_min_of_arrivals_and_capacity() {
    for n in [0, 1, 2, 50, 99, 100, 101, 105, 250, 1000] {
        let panel = filled(n);
        assert_eq!(panel.len(), n.min(CAPACITY), "after {n} arrivals");
    }
}

#[test]
fn capacity_is_one_hundred() {
    assert_eq!(CAPACITY, 100);
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[test]
fn survivors_are_a_suffix_of_arrivals() {
    for n in [3, 100, 137] {
        let arrivals = lines(0..n);
        let panel = filled(n);
        let kept = panel.texts();
        let suffix: Vec<&str> = arrivals[n - kept.len()..]
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(kept, suffix, "after {n} arrivals");
    }
}

#[test]
fn duplicates_are_kept() {
    let mut panel = LogPanel::new(5);
    panel.push("same");
    panel.push("same");
    panel.push("same");
    assert_eq!(panel.texts(), ["same", "same", "same"]);
}

// ---------------------------------------------------------------------------
// Eviction
// ---------------------------------------------------------------------------

#[test]
fn one_over_capacity_drops_the_oldest() {
    let mut panel = filled(CAPACITY);
    let before: Vec<String> = panel.texts().iter().map(|s| s.to_string()).collect();

    panel.push("newest");

    let mut expected: Vec<&str> = before[1..].iter().map(String::as_str).collect();
    expected.push("newest");
    assert_eq!(panel.texts(), expected);
}

#[test]
fn burst_of_five_keeps_last_hundred_of_all_arrivals() {
    let mut panel = filled(CAPACITY);
    for line in lines(CAPACITY..CAPACITY + 5) {
        panel.push(line);
    }

    let arrivals = lines(0..CAPACITY + 5);
    let expected: Vec<&str> = arrivals[5..].iter().map(String::as_str).collect();
    assert_eq!(panel.len(), CAPACITY);
    assert_eq!(panel.texts(), expected);
}

// ---------------------------------------------------------------------------
// Scrolling
// ---------------------------------------------------------------------------

#[test]
fn two_lines_scroll_to_bottom_after_each() {
    let mut panel = LogPanel::new(1);

    panel.push("line1");
    assert_eq!(panel.texts(), ["line1"]);
    assert_eq!(panel.scroll_top(), panel.max_scroll());

    panel.push("line2");
    assert_eq!(panel.texts(), ["line1", "line2"]);
    assert_eq!(panel.scroll_top(), panel.max_scroll());
    assert_eq!(panel.scroll_top(), 1);
}

#[test]
fn short_panel_never_scrolls() {
    let mut panel = LogPanel::new(20);
    panel.push("a");
    panel.push("b");
    assert_eq!(panel.scroll_top(), 0);
    assert_eq!(panel.visible().count(), 2);
}

#[test]
fn text_is_stored_verbatim() {
    let mut panel = LogPanel::new(5);
    panel.push("  <b>not markup</b>  \t");
    assert_eq!(panel.texts(), ["  <b>not markup</b>  \t"]);
}

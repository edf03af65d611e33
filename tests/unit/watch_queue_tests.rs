/*!
 * Tests for the single-flight watch queue
 */

use std::path::PathBuf;

use polysub::watch::{Offer, WatchQueue};

fn dirs() -> (PathBuf, PathBuf) {
    (PathBuf::from("/watch/a"), PathBuf::from("/watch/b"))
}

/// Test that only one file runs at a time across directories
#[test]
fn test_offer_withTwoDirectories_shouldRunOneAtATime() {
    let (a, b) = dirs();
    let mut queue = WatchQueue::new();
    queue.add_directory(&a);
    queue.add_directory(&b);

    let a1 = a.join("one.srt");
    let b1 = b.join("two.srt");
    let a2 = a.join("three.srt");

    assert_eq!(queue.offer(&a, &a1), Offer::Start(a1.clone()));
    assert_eq!(queue.offer(&b, &b1), Offer::Queued { depth: 1 });
    assert_eq!(queue.offer(&a, &a2), Offer::Queued { depth: 2 });
    assert_eq!(queue.running(), Some(a1.as_path()));

    // Arrival order, not directory order
    assert_eq!(queue.finish(), Some(b1.clone()));
    assert_eq!(queue.depth(), 1);
    assert_eq!(queue.finish(), Some(a2));
    assert_eq!(queue.finish(), None);
    assert!(queue.is_idle());
}

/// Test that a file is only ever offered once per directory
#[test]
fn test_offer_withSamePathTwice_shouldReportAlreadySeen() {
    let (a, _) = dirs();
    let mut queue = WatchQueue::new();
    queue.add_directory(&a);
    let file = a.join("one.srt");

    assert_eq!(queue.offer(&a, &file), Offer::Start(file.clone()));
    assert_eq!(queue.offer(&a, &file), Offer::AlreadySeen);

    queue.finish();
    assert_eq!(queue.offer(&a, &file), Offer::AlreadySeen);
}

/// Test that files marked at startup are never queued
#[test]
fn test_mark_seen_withExistingFile_shouldIgnoreLaterOffers() {
    let (a, _) = dirs();
    let mut queue = WatchQueue::new();
    queue.add_directory(&a);
    let existing = a.join("old.srt");

    queue.mark_seen(&a, &existing);

    assert_eq!(queue.offer(&a, &existing), Offer::AlreadySeen);
    assert!(queue.is_idle());
}

/// Test directory bookkeeping
#[test]
fn test_remove_directory_shouldKeepQueuedFiles() {
    let (a, b) = dirs();
    let mut queue = WatchQueue::new();
    assert!(queue.add_directory(&a));
    assert!(!queue.add_directory(&a));
    queue.add_directory(&b);

    let a1 = a.join("one.srt");
    let b1 = b.join("two.srt");
    queue.offer(&a, &a1);
    queue.offer(&b, &b1);

    assert!(queue.remove_directory(&b));
    assert!(!queue.is_watching(&b));
    assert_eq!(queue.offer(&b, &b.join("late.srt")), Offer::AlreadySeen);
    assert_eq!(queue.finish(), Some(b1));
    assert_eq!(queue.directories(), vec![a]);
}

use hostcrawl::UniqueSet;
use url::Url;

fn url(input: &str) -> Url {
    Url::parse(input).expect("test url")
}

#[test]
fn test_repeat_adds_are_rejected() {
    let set = UniqueSet::new();
    let target = url("https://domain.com");

    assert!(set.add_if_absent(&target));
    assert!(!set.add_if_absent(&target));
    assert!(!set.add_if_absent(&target));
}

#[test]
fn test_url_fragments_are_ignored() {
    let set = UniqueSet::new();

    assert!(set.add_if_absent(&url("https://www.facebook.com/home")));
    assert!(!set.add_if_absent(&url("https://www.facebook.com/home#jump-to-headline")));
}

#[test]
fn test_scheme_is_not_part_of_identity() {
    let set = UniqueSet::new();

    assert!(set.add_if_absent(&url("https://domain.com/pricing")));
    assert!(!set.add_if_absent(&url("http://domain.com/pricing")));
}

#[test]
fn test_query_is_part_of_identity() {
    let set = UniqueSet::new();

    assert!(set.add_if_absent(&url("https://domain.com/search?q=rust")));
    assert!(set.add_if_absent(&url("https://domain.com/search?q=go")));
    assert!(!set.add_if_absent(&url("https://domain.com/search?q=rust")));
}

#[test]
fn test_distinct_hosts_are_distinct() {
    let set = UniqueSet::new();

    assert!(set.add_if_absent(&url("https://domain.com/about")));
    assert!(set.add_if_absent(&url("https://other.com/about")));
}

#[test]
fn test_concurrent_adds_admit_exactly_once() {
    use std::sync::Arc;
    use std::thread;

    let set = Arc::new(UniqueSet::new());
    let target = url("https://domain.com/contended");

    let mut handles = vec![];
    for _ in 0..8 {
        let set = set.clone();
        let target = target.clone();
        handles.push(thread::spawn(move || {
            let mut admitted = 0usize;
            for _ in 0..100 {
                if set.add_if_absent(&target) {
                    admitted += 1;
                }
            }
            admitted
        }));
    }

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 1, "exactly one add across all threads may succeed");
}

use rs2_pull::collector;
use rs2_pull::collector::Collector;
use rs2_pull::*;
use std::collections::{BTreeSet, HashMap, HashSet};

#[test]
fn test_for_each_and_for_each_while() {
    let mut seen = Vec::new();
    PullStream::of(vec![1, 2, 3]).for_each(|x| seen.push(x)).unwrap();
    assert_eq!(seen, vec![1, 2, 3]);

    let mut taken = Vec::new();
    PullStream::of(vec![1, 2, 3, 4])
        .for_each_while(|x| {
            taken.push(x);
            x < 2
        })
        .unwrap();
    assert_eq!(taken, vec![1, 2]);
}

#[test]
fn test_reduce_forms() {
    assert_eq!(PullStream::of(vec![1, 2, 3, 4]).reduce(|a, b| a + b).unwrap(), Some(10));
    assert_eq!(PullStream::<i32>::empty().reduce(|a, b| a + b).unwrap(), None);
    assert_eq!(PullStream::of(vec![1, 2, 3]).reduce_with(10, |a, b| a + b).unwrap(), 16);
    assert_eq!(PullStream::<i32>::empty().reduce_with(10, |a, b| a + b).unwrap(), 10);

    let total_len = PullStream::of(vec!["ab", "cde"]).fold(0, |acc, s| acc + s.len()).unwrap();
    assert_eq!(total_len, 5);
}

#[test]
fn test_collect_forms() {
    let set: BTreeSet<i32> = PullStream::of(vec![3, 1, 3]).collect().unwrap();
    assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 3]);

    let joined = PullStream::of(vec!["a", "b"])
        .collect_with(String::new, |acc, s| acc.push_str(s))
        .unwrap();
    assert_eq!(joined, "ab");
}

#[test]
fn test_stock_collectors() {
    assert_eq!(
        PullStream::of(vec![1, 2, 3]).collect_by(collector::to_vec()).unwrap(),
        vec![1, 2, 3]
    );

    let set = PullStream::of(vec![1, 1, 2]).collect_by(collector::to_hash_set()).unwrap();
    assert_eq!(set, HashSet::from([1, 2]));

    assert_eq!(PullStream::of(vec!["x"; 4]).collect_by(collector::counting()).unwrap(), 4);

    let joined = PullStream::of(vec![1, 2, 3]).collect_by(collector::joining(", ")).unwrap();
    assert_eq!(joined, "1, 2, 3");
    let empty_parts = PullStream::of(vec!["", ""]).collect_by(collector::joining("-")).unwrap();
    assert_eq!(empty_parts, "-");
    assert_eq!(
        PullStream::<i32>::empty().collect_by(collector::joining(",")).unwrap(),
        ""
    );

    let groups = PullStream::of(vec![1, 2, 3, 4, 5])
        .collect_by(collector::grouping_by(|x: &i32| x % 2 == 0))
        .unwrap();
    let expected: HashMap<bool, Vec<i32>> = HashMap::from([(false, vec![1, 3, 5]), (true, vec![2, 4])]);
    assert_eq!(groups, expected);
}

#[test]
fn test_from_fns_collector_and_combine() {
    let mut summing = collector::from_fns(
        || 0i64,
        |acc: &mut i64, x: i32| *acc += x as i64,
        |a: i64, b: i64| a + b,
        |acc: i64| acc * 2,
    );

    let mut left = Collector::<i32>::supply(&mut summing);
    Collector::<i32>::accumulate(&mut summing, &mut left, 1);
    Collector::<i32>::accumulate(&mut summing, &mut left, 2);
    let mut right = Collector::<i32>::supply(&mut summing);
    Collector::<i32>::accumulate(&mut summing, &mut right, 3);
    let combined = Collector::<i32>::combine(&mut summing, left, right);
    assert_eq!(Collector::<i32>::finish(summing, combined), 12);

    let doubled_sum = PullStream::of(vec![1, 2, 3])
        .collect_by(collector::from_fns(
            || 0i64,
            |acc: &mut i64, x: i32| *acc += x as i64,
            |a: i64, b: i64| a + b,
            |acc: i64| acc * 2,
        ))
        .unwrap();
    assert_eq!(doubled_sum, 12);

    let mut joining = collector::joining("+");
    let left = Some("a".to_string());
    let right = Some("b".to_string());
    assert_eq!(
        Collector::<&str>::combine(&mut joining, left, right),
        Some("a+b".to_string())
    );
}

#[test]
fn test_count_and_to_vec() {
    assert_eq!(PullStream::of(vec![1, 2, 3]).count().unwrap(), 3);
    assert_eq!(PullStream::of(vec![1, 2, 3]).filter(|x| *x > 1).count().unwrap(), 2);
    assert_eq!(PullStream::<u8>::empty().count().unwrap(), 0);
}

#[test]
fn test_min_max() {
    assert_eq!(PullStream::of(vec![4, 1, 7, 3]).min().unwrap(), Some(1));
    assert_eq!(PullStream::of(vec![4, 1, 7, 3]).max().unwrap(), Some(7));
    assert_eq!(PullStream::<i32>::empty().max().unwrap(), None);
    assert_eq!(PullStream::of(vec![4, 1, 7]).sorted().min().unwrap(), Some(1));
    assert_eq!(PullStream::of(vec![4, 1, 7]).sorted().max().unwrap(), Some(7));

    let shortest = PullStream::of(vec!["ccc", "a", "bb", "b"])
        .min_by(|a, b| a.len().cmp(&b.len()))
        .unwrap();
    assert_eq!(shortest, Some("a"));
    let longest = PullStream::of(vec!["aa", "ccc", "bbb"])
        .max_by(|a, b| a.len().cmp(&b.len()))
        .unwrap();
    assert_eq!(longest, Some("ccc"));
}

#[test]
fn test_kth_largest() {
    let values = vec![5, 1, 9, 3, 7];
    assert_eq!(PullStream::of(values.clone()).kth_largest(1).unwrap(), Some(9));
    assert_eq!(PullStream::of(values.clone()).kth_largest(2).unwrap(), Some(7));
    assert_eq!(PullStream::of(values.clone()).kth_largest(5).unwrap(), Some(1));
    assert_eq!(PullStream::of(values.clone()).kth_largest(6).unwrap(), None);
    assert!(matches!(
        PullStream::of(values.clone()).kth_largest(0),
        Err(StreamError::InvalidArgument(_))
    ));

    assert_eq!(PullStream::of(vec![2, 2, 1]).kth_largest(2).unwrap(), Some(2));

    let second_smallest = PullStream::of(values)
        .kth_largest_by(2, |a: &i32, b: &i32| b.cmp(a))
        .unwrap();
    assert_eq!(second_smallest, Some(3));
}

#[test]
fn test_match_predicates() {
    let values = vec![2, 4, 6];
    assert!(PullStream::of(values.clone()).all_match(|x| x % 2 == 0).unwrap());
    assert!(PullStream::of(values.clone()).any_match(|x| *x == 4).unwrap());
    assert!(PullStream::of(values.clone()).none_match(|x| *x > 10).unwrap());
    assert!(!PullStream::of(values).none_match(|x| *x == 6).unwrap());

    assert!(PullStream::<i32>::empty().all_match(|_| false).unwrap());
    assert!(PullStream::<i32>::empty().none_match(|_| true).unwrap());
    assert!(!PullStream::<i32>::empty().any_match(|_| true).unwrap());
}

#[test]
fn test_any_match_short_circuits() {
    let result = PullStream::generate(|| 1).any_match(|x| *x == 1).unwrap();
    assert!(result);
}

#[test]
fn test_first_returns_present_element() {
    // regression: first() must return the element when one is available
    assert_eq!(PullStream::of(vec![42, 7]).first().unwrap(), Some(42));
    assert_eq!(PullStream::of(vec![1, 2, 3]).skip(1).first().unwrap(), Some(2));
    assert_eq!(PullStream::<i32>::empty().first().unwrap(), None);
    assert_eq!(PullStream::of(vec![1]).filter(|_| false).first().unwrap(), None);
}

#[test]
fn test_find_variants() {
    let values = vec![1, 4, 6, 9, 10];
    assert_eq!(PullStream::of(values.clone()).find_first(|x| x % 2 == 0).unwrap(), Some(4));
    assert_eq!(PullStream::of(values.clone()).find_any(|x| x % 2 == 0).unwrap(), Some(4));
    assert_eq!(PullStream::of(values.clone()).find_last(|x| x % 2 == 0).unwrap(), Some(10));
    assert_eq!(PullStream::of(values.clone()).find_first(|x| *x > 100).unwrap(), None);
    assert_eq!(PullStream::of(values.clone()).find_last(|x| *x > 100).unwrap(), None);
    assert_eq!(PullStream::of(values).last().unwrap(), Some(10));
    assert_eq!(PullStream::<i32>::empty().last().unwrap(), None);
}

#[test]
fn test_std_iterator_adapter() {
    let collected: Vec<i32> = PullStream::of(vec![1, 2, 3])
        .map(|x| x * 2)
        .into_iter()
        .collect::<StreamResult<Vec<i32>>>()
        .unwrap();
    assert_eq!(collected, vec![2, 4, 6]);

    let mut sum = 0;
    for item in PullStream::of(vec![1, 2, 3]) {
        sum += item.unwrap();
    }
    assert_eq!(sum, 6);
}

#[test]
fn test_std_iterator_stops_after_error() {
    let mut iter = PullStream::from_results(vec![Ok(1), Err(StreamError::Timeout), Ok(3)]).into_iter();
    assert_eq!(iter.next(), Some(Ok(1)));
    assert_eq!(iter.next(), Some(Err(StreamError::Timeout)));
    assert_eq!(iter.next(), None);
}

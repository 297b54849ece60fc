use std::thread;

use super::*;

/// Run `f` on every rank of a fresh group and collect results in rank order.
fn run_group<T, F>(size: usize, f: F) -> Vec<T>
where
  T: Send,
  F: Fn(&LocalGroup) -> T + Sync,
{
  let group = LocalGroup::create(size);
  let f = &f;
  thread::scope(|s| {
    let handles: Vec<_> = group.iter().map(|comm| s.spawn(move || f(comm))).collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  })
}

#[test]
fn test_create_assigns_ranks() {
  let group = LocalGroup::create(3);
  let ranks: Vec<(usize, usize)> = group.iter().map(|c| (c.rank(), c.size())).collect();
  assert_eq!(ranks, vec![(0, 3), (1, 3), (2, 3)]);
  assert!(group[0].is_root());
}

#[test]
fn test_all_reduce_min_max() {
  let results = run_group(3, |comm| {
    let r = comm.rank() as f64;
    comm
      .all_reduce_min_max([r, r + 1.0, -r, 1.0, 0.0, r * 10.0])
      .unwrap()
  });
  for bounds in results {
    assert_eq!(bounds, [0.0, 3.0, -2.0, 1.0, 0.0, 20.0]);
  }
}

#[test]
fn test_all_reduce_or() {
  let any = run_group(4, |comm| comm.all_reduce_or(comm.rank() == 2).unwrap());
  assert_eq!(any, vec![true; 4]);
  let none = run_group(4, |comm| comm.all_reduce_or(false).unwrap());
  assert_eq!(none, vec![false; 4]);
}

#[test]
fn test_gather_to_root_in_rank_order() {
  let results = run_group(3, |comm| {
    let local: Vec<u32> = (0..comm.rank() as u32).map(|i| 10 * comm.rank() as u32 + i).collect();
    comm.gather_to_root(&local).unwrap()
  });
  assert_eq!(results[0], Some(vec![10, 20, 21]));
  assert_eq!(results[1], None);
  assert_eq!(results[2], None);
}

#[test]
fn test_broadcast_takes_root_value() {
  let results = run_group(3, |comm| comm.broadcast_u64(100 + comm.rank() as u64).unwrap());
  assert_eq!(results, vec![100, 100, 100]);
}

#[test]
fn test_sequence_of_collectives_stays_in_step() {
  let results = run_group(4, |comm| {
    let mut log = Vec::new();
    for round in 0..20u64 {
      let any = comm.all_reduce_or(round % 4 == comm.rank() as u64).unwrap();
      let root = comm.broadcast_u64(round).unwrap();
      let gathered = comm.gather_to_root(&[comm.rank() as u32]).unwrap();
      log.push((any, root, gathered.map(|g| g.len())));
    }
    log
  });
  for (rank, log) in results.iter().enumerate() {
    for (round, (any, root, gathered)) in log.iter().enumerate() {
      assert!(*any);
      assert_eq!(*root, round as u64);
      assert_eq!(*gathered, if rank == 0 { Some(4) } else { None });
    }
  }
}

#[test]
fn test_mismatched_collectives_fail_on_every_rank() {
  let results = run_group(2, |comm| {
    if comm.is_root() {
      comm.all_reduce_or(true).map(|_| ())
    } else {
      comm.broadcast_u64(1).map(|_| ())
    }
  });
  assert!(results.iter().all(|r| matches!(r, Err(StreamError::Collective(_)))));
}

#[test]
fn test_single_rank_group() {
  let group = LocalGroup::create(1);
  let comm = &group[0];
  assert_eq!(comm.gather_to_root(&[5]).unwrap(), Some(vec![5]));
  assert_eq!(comm.all_reduce_min_max([0.0, 1.0, 0.0, 1.0, 0.0, 1.0]).unwrap()[1], 1.0);
}

#[test]
fn test_departed_peer_fails_the_survivors() {
  let mut group = LocalGroup::create(3);
  drop(group.pop());
  let results: Vec<_> = thread::scope(|s| {
    let handles: Vec<_> = group
      .iter()
      .map(|comm| {
        s.spawn(move || {
          let first = comm.all_reduce_or(true);
          let second = comm.broadcast_u64(7);
          (first, second)
        })
      })
      .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });
  assert_eq!(results.len(), 2);
  for (first, second) in results {
    assert!(matches!(first, Err(StreamError::Collective(_))));
    assert!(matches!(second, Err(StreamError::Collective(_))));
  }
}

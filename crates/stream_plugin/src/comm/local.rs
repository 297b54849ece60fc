//! In-process rank group over channels.
//!
//! Hub and spoke: every collective sends each peer's contribution to rank 0
//! over that peer's own channel. The root combines them in rank order and
//! replies to every peer. A peer that has gone away is seen by the root as a
//! closed channel, and the surviving peers get a failed reply.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{combine_min_max, Collectives};
use crate::error::{StreamError, StreamResult};

#[derive(Clone, Debug)]
enum Contribution {
  Bounds([f64; 6]),
  Flag(bool),
  Ids(Vec<u32>),
  Value(u64),
}

#[derive(Clone, Debug)]
enum Reply {
  Bounds([f64; 6]),
  Flag(bool),
  Ids(Vec<u32>),
  Value(u64),
  Failed(String),
}

/// Root end of the channels to one peer.
struct PeerLink {
  rank: usize,
  inbox: Receiver<Contribution>,
  reply: Sender<Reply>,
}

enum Role {
  Root { peers: Vec<PeerLink> },
  Peer {
    to_root: Sender<Contribution>,
    from_root: Receiver<Reply>,
  },
}

/// One rank of an in-process group created by [`LocalGroup::create`].
pub struct LocalGroup {
  rank: usize,
  size: usize,
  role: Role,
}

fn disconnected(rank: usize) -> StreamError {
  StreamError::Collective(format!("rank {rank} lost its peers"))
}

fn mismatch(expected: &str, rank: usize, got: &Contribution) -> StreamError {
  StreamError::Collective(format!("expected {expected} from rank {rank}, got {got:?}"))
}

impl LocalGroup {
  /// Build a group of `size` ranks; element `i` is rank `i`.
  pub fn create(size: usize) -> Vec<LocalGroup> {
    let size = size.max(1);
    let mut ranks = Vec::with_capacity(size);
    let mut peers = Vec::with_capacity(size - 1);

    for rank in 1..size {
      let (to_root, inbox) = unbounded();
      let (reply, from_root) = unbounded();
      peers.push(PeerLink { rank, inbox, reply });
      ranks.push(LocalGroup {
        rank,
        size,
        role: Role::Peer { to_root, from_root },
      });
    }

    ranks.insert(
      0,
      LocalGroup {
        rank: 0,
        size,
        role: Role::Root { peers },
      },
    );
    ranks
  }

  /// Send `local` to the root, let it `combine` all contributions in rank
  /// order, and return the combined reply on every rank.
  fn round_trip(
    &self,
    local: Contribution,
    combine: impl FnOnce(Vec<(usize, Contribution)>) -> StreamResult<Reply>,
  ) -> StreamResult<Reply> {
    match &self.role {
      Role::Peer { to_root, from_root } => {
        to_root.send(local).map_err(|_| disconnected(self.rank))?;
        match from_root.recv().map_err(|_| disconnected(self.rank))? {
          Reply::Failed(reason) => Err(StreamError::Collective(reason)),
          reply => Ok(reply),
        }
      }
      Role::Root { peers } => {
        let mut all = Vec::with_capacity(self.size);
        all.push((0, local));
        let mut lost = None;
        // Live peers are drained even after a loss.
        for peer in peers {
          match peer.inbox.recv() {
            Ok(contribution) => all.push((peer.rank, contribution)),
            Err(_) => {
              lost.get_or_insert(peer.rank);
            }
          }
        }

        let result = match lost {
          Some(rank) => {
            tracing::warn!(rank, "peer left the group");
            Err(StreamError::Collective(format!("rank {rank} left the group")))
          }
          None => combine(all),
        };

        let reply = match &result {
          Ok(reply) => reply.clone(),
          Err(e) => Reply::Failed(e.to_string()),
        };
        for peer in peers {
          // A departed peer has nobody left to read its reply.
          let _ = peer.reply.send(reply.clone());
        }
        result
      }
    }
  }
}

fn unexpected(reply: Reply) -> StreamError {
  StreamError::Collective(format!("unexpected reply {reply:?}"))
}

impl Collectives for LocalGroup {
  fn rank(&self) -> usize {
    self.rank
  }

  fn size(&self) -> usize {
    self.size
  }

  fn all_reduce_min_max(&self, local: [f64; 6]) -> StreamResult<[f64; 6]> {
    let reply = self.round_trip(Contribution::Bounds(local), |all| {
      let mut acc = [f64::MAX, -f64::MAX, f64::MAX, -f64::MAX, f64::MAX, -f64::MAX];
      for (rank, c) in all {
        match c {
          Contribution::Bounds(b) => combine_min_max(&mut acc, &b),
          other => return Err(mismatch("bounds", rank, &other)),
        }
      }
      Ok(Reply::Bounds(acc))
    })?;
    match reply {
      Reply::Bounds(b) => Ok(b),
      other => Err(unexpected(other)),
    }
  }

  fn all_reduce_or(&self, local: bool) -> StreamResult<bool> {
    let reply = self.round_trip(Contribution::Flag(local), |all| {
      let mut any = false;
      for (rank, c) in all {
        match c {
          Contribution::Flag(flag) => any |= flag,
          other => return Err(mismatch("flag", rank, &other)),
        }
      }
      Ok(Reply::Flag(any))
    })?;
    match reply {
      Reply::Flag(flag) => Ok(flag),
      other => Err(unexpected(other)),
    }
  }

  fn gather_to_root(&self, local: &[u32]) -> StreamResult<Option<Vec<u32>>> {
    let reply = self.round_trip(Contribution::Ids(local.to_vec()), |all| {
      let mut out = Vec::new();
      for (rank, c) in all {
        match c {
          Contribution::Ids(ids) => out.extend(ids),
          other => return Err(mismatch("ids", rank, &other)),
        }
      }
      Ok(Reply::Ids(out))
    })?;
    match reply {
      Reply::Ids(ids) if self.is_root() => Ok(Some(ids)),
      Reply::Ids(_) => Ok(None),
      other => Err(unexpected(other)),
    }
  }

  fn broadcast_u64(&self, value: u64) -> StreamResult<u64> {
    let reply = self.round_trip(Contribution::Value(value), |all| {
      let mut root_value = None;
      for (rank, c) in all {
        match c {
          Contribution::Value(v) => {
            root_value.get_or_insert(v);
          }
          other => return Err(mismatch("value", rank, &other)),
        }
      }
      root_value
        .map(Reply::Value)
        .ok_or_else(|| StreamError::Collective("empty group".into()))
    })?;
    match reply {
      Reply::Value(v) => Ok(v),
      other => Err(unexpected(other)),
    }
  }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod local_test;

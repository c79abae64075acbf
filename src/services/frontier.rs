// src/services/frontier.rs

//! Breadth-first crawl frontier.

use std::collections::{HashSet, VecDeque};

use crate::models::CandidateUrl;

/// Queue of pages still to visit plus the bookkeeping sets of a crawl.
///
/// `discovered` holds every URL ever admitted, so a URL enters the queue and
/// the ordered output at most once. `visited` holds pages actually fetched.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    discovered: HashSet<String>,
    visited: HashSet<String>,
    ordered: Vec<CandidateUrl>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a URL. Returns `false` if it was already discovered.
    pub fn push(&mut self, url: &str, discovered_from: &str) -> bool {
        if !self.discovered.insert(url.to_string()) {
            return false;
        }
        self.queue.push_back(url.to_string());
        self.ordered
            .push(CandidateUrl::new(url, discovered_from));
        true
    }

    /// Next unvisited URL, marking it visited.
    pub fn next_unvisited(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Discovered URLs in first-seen order.
    pub fn into_candidates(self) -> Vec<CandidateUrl> {
        self.ordered
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Modification ledger — image replacements scheduled but not yet saved.

use pdfwerk_core::ImageModification;
use tracing::debug;

/// Outcome of [`ModificationLedger::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// A new entry was appended.
    Added,
    /// An entry for the same page and rectangle had its image swapped.
    Replaced,
}

/// Ordered list of scheduled image replacements.
///
/// Holds at most one entry per `(page, target)` pair; entries keep the order
/// in which their target was first scheduled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModificationLedger {
    entries: Vec<ImageModification>,
}

impl ModificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a replacement, or swap the image of an existing one for the same
    /// page and rectangle.
    pub fn schedule(&mut self, modification: ImageModification) -> Scheduled {
        let existing = self
            .entries
            .iter_mut()
            .find(|entry| entry.page == modification.page && entry.target == modification.target);

        match existing {
            Some(entry) => {
                debug!(page = modification.page, target = %modification.target, "Replacing scheduled image");
                *entry = modification;
                Scheduled::Replaced
            }
            None => {
                debug!(page = modification.page, target = %modification.target, "Scheduling image");
                self.entries.push(modification);
                Scheduled::Added
            }
        }
    }

    /// Drop every entry on `page`, returning how many were removed.
    pub fn clear_page(&mut self, page: usize) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.page != page);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn for_page(&self, page: usize) -> impl Iterator<Item = &ImageModification> {
        self.entries.iter().filter(move |entry| entry.page == page)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageModification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

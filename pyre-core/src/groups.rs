//! Group bookkeeping for a single parse
//!
//! `ParseState` tracks every capture group of a pattern while it is parsed:
//! - mapping names to group numbers (injectively)
//! - which groups are closed, so backreferences can be validated
//! - the look-behind boundary for backreferences inside a look-behind
//! - forward references that must be validated once parsing is done
//!
//! Group 0 is reserved for the whole match.

use std::collections::HashMap;

use crate::ast::MAXGROUPS;
use crate::error::quote;
use crate::flags::Flags;

/// State shared by every subpattern created during one parse call
#[derive(Debug, Clone)]
pub struct ParseState {
    /// Global flags, including those set by a leading `(?flags)`
    pub flags: Flags,
    /// Map from group name to group number
    names: HashMap<String, usize>,
    /// Closed flag per group number, group 0 included
    closed: Vec<bool>,
    /// First group number not visible from inside the active look-behind
    lookbehind_groups: Option<usize>,
    /// Forward references by conditional groups: (group, pattern offset)
    pending_refs: Vec<(usize, usize)>,
}

impl ParseState {
    /// Create the state for a new parse
    pub fn new(flags: Flags) -> Self {
        ParseState {
            flags,
            names: HashMap::new(),
            closed: vec![false],
            lookbehind_groups: None,
            pending_refs: Vec::new(),
        }
    }

    /// Number of groups, group 0 included
    pub fn groups(&self) -> usize {
        self.closed.len()
    }

    /// Open a new group and return its number
    ///
    /// # Errors
    /// Returns an error if the name is already in use or there are too many groups
    pub fn open_group(&mut self, name: Option<&str>) -> Result<usize, GroupError> {
        let gid = self.groups();
        self.closed.push(false);
        if self.groups() > MAXGROUPS {
            return Err(GroupError::TooManyGroups);
        }
        if let Some(name) = name {
            if let Some(&previous) = self.names.get(name) {
                return Err(GroupError::Redefinition {
                    name: name.to_string(),
                    gid,
                    previous,
                });
            }
            self.names.insert(name.to_string(), gid);
        }
        Ok(gid)
    }

    /// Mark a group as closed
    pub fn close_group(&mut self, gid: usize) {
        if let Some(closed) = self.closed.get_mut(gid) {
            *closed = true;
        }
    }

    /// Whether the group exists and is closed
    pub fn check_group(&self, gid: usize) -> bool {
        self.closed.get(gid).copied().unwrap_or(false)
    }

    /// Get a group number by name
    pub fn get_by_name(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// All named groups
    pub fn names(&self) -> &HashMap<String, usize> {
        &self.names
    }

    /// Group names indexed by group number; unnamed groups are empty
    pub fn group_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.groups()];
        for (name, &gid) in &self.names {
            names[gid] = name.clone();
        }
        names
    }

    /// Enter a look-behind. Returns the boundary to restore on exit.
    pub fn enter_lookbehind(&mut self) -> Option<usize> {
        let saved = self.lookbehind_groups;
        if saved.is_none() {
            self.lookbehind_groups = Some(self.groups());
        }
        saved
    }

    /// Leave a look-behind entered with [`ParseState::enter_lookbehind`]
    pub fn exit_lookbehind(&mut self, saved: Option<usize>) {
        if saved.is_none() {
            self.lookbehind_groups = None;
        }
    }

    /// Check that a backreference to `gid` is legal inside the active look-behind
    pub fn check_lookbehind_group(&self, gid: usize) -> Result<(), GroupError> {
        if let Some(boundary) = self.lookbehind_groups {
            if !self.check_group(gid) {
                return Err(GroupError::OpenGroup);
            }
            if gid >= boundary {
                return Err(GroupError::SameLookbehind);
            }
        }
        Ok(())
    }

    /// Remember where a forward reference to `gid` appeared
    pub fn note_ref(&mut self, gid: usize, pos: usize) {
        if !self.pending_refs.iter().any(|&(g, _)| g == gid) {
            self.pending_refs.push((gid, pos));
        }
    }

    /// Forward references that name a group that was never declared
    pub fn unresolved_refs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let groups = self.groups();
        self.pending_refs
            .iter()
            .copied()
            .filter(move |&(gid, _)| gid >= groups)
    }
}

/// Errors that can occur while tracking groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// A group name is used more than once
    Redefinition {
        name: String,
        gid: usize,
        previous: usize,
    },
    /// The group limit was exceeded
    TooManyGroups,
    /// A backreference targets a group that is still open
    OpenGroup,
    /// A backreference inside a look-behind targets a group of the same look-behind
    SameLookbehind,
}

impl std::fmt::Display for GroupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupError::Redefinition {
                name,
                gid,
                previous,
            } => write!(
                f,
                "redefinition of group name {} as group {}; was group {}",
                quote(name, true),
                gid,
                previous
            ),
            GroupError::TooManyGroups => write!(f, "too many groups"),
            GroupError::OpenGroup => write!(f, "cannot refer to an open group"),
            GroupError::SameLookbehind => write!(
                f,
                "cannot refer to group defined in the same lookbehind subpattern"
            ),
        }
    }
}

impl std::error::Error for GroupError {}

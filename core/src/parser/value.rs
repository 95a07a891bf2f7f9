//! Separator-based matching of one switch value against its value template.

use std::collections::HashSet;

use crate::template::{ValueSegment, ValueTemplate};

impl ValueTemplate {
    /// Decomposes `value` into one capture per slot, in template order.
    ///
    /// The match is anchored at both ends. The first slot takes the shortest
    /// capture that still lets the remainder match; every later slot takes
    /// the longest. Captures may be empty. Returns `None` when the value does
    /// not fit the template.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_shell_core::ValueTemplate;
    ///
    /// let volume = ValueTemplate::parse("[[Name]]:[[MapTo]]");
    /// let captures = volume.capture("/etc/timezone:/etc/timezone:ro").unwrap();
    /// assert_eq!(captures[0], ("Name", "/etc/timezone".to_string()));
    /// assert_eq!(captures[1], ("MapTo", "/etc/timezone:ro".to_string()));
    ///
    /// assert!(volume.capture("no-separator").is_none());
    /// ```
    pub fn capture(&self, value: &str) -> Option<Vec<(&str, String)>> {
        let mut matcher = Matcher {
            value,
            captures: Vec::with_capacity(self.slot_count()),
            dead_ends: HashSet::new(),
        };
        matcher.match_segments(self.segments(), 0, true).then(|| {
            matcher
                .captures
                .into_iter()
                .map(|(name, text)| (name, text.to_string()))
                .collect()
        })
    }
}

struct Matcher<'t, 'v> {
    value: &'v str,
    captures: Vec<(&'t str, &'v str)>,
    /// `(segments left, offset)` pairs from which the rest cannot match.
    dead_ends: HashSet<(usize, usize)>,
}

impl<'t, 'v> Matcher<'t, 'v> {
    fn match_segments(&mut self, segments: &'t [ValueSegment], pos: usize, first_slot: bool) -> bool {
        let Some((segment, rest)) = segments.split_first() else {
            return pos == self.value.len();
        };
        if self.dead_ends.contains(&(segments.len(), pos)) {
            return false;
        }

        let matched = match segment {
            ValueSegment::Literal(literal) => {
                self.value[pos..].starts_with(literal.as_str())
                    && self.match_segments(rest, pos + literal.len(), first_slot)
            }
            ValueSegment::Slot(name) if rest.is_empty() => {
                self.captures.push((name.as_str(), &self.value[pos..]));
                true
            }
            ValueSegment::Slot(name) => {
                let value = self.value;
                let next = rest.first();
                let ends = (pos..=value.len()).filter(|&end| slot_can_end(value, end, next));
                if first_slot {
                    self.try_ends(name.as_str(), rest, pos, ends)
                } else {
                    self.try_ends(name.as_str(), rest, pos, ends.rev())
                }
            }
        };

        if !matched {
            self.dead_ends.insert((segments.len(), pos));
        }
        matched
    }

    fn try_ends(
        &mut self,
        name: &'t str,
        rest: &'t [ValueSegment],
        pos: usize,
        ends: impl Iterator<Item = usize>,
    ) -> bool {
        for end in ends {
            self.captures.push((name, &self.value[pos..end]));
            if self.match_segments(rest, end, false) {
                return true;
            }
            self.captures.pop();
        }
        false
    }
}

/// Whether a slot may end at `end`: a char boundary where the next literal
/// (if any) starts.
fn slot_can_end(value: &str, end: usize, next: Option<&ValueSegment>) -> bool {
    value.is_char_boundary(end)
        && match next {
            Some(ValueSegment::Literal(literal)) => value[end..].starts_with(literal.as_str()),
            _ => true,
        }
}

use crate::relation::Relation;
use crate::Persons;
use smallvec::SmallVec;

type Parts<'a> = SmallVec<[&'a str; 4]>;

/// What a name's components turned out to be when aligned against the
/// other name's components.
#[derive(Clone, Copy, Default)]
struct Labels {
    me_initial: bool,
    it_initial: bool,
    unknown: bool,
}

impl Labels {
    fn union(self, other: Labels) -> Labels {
        Labels {
            me_initial: self.me_initial || other.me_initial,
            it_initial: self.it_initial || other.it_initial,
            unknown: self.unknown || other.unknown,
        }
    }
}

/// The first character of a component, as a subslice.
fn initial(s: &str) -> &str {
    let len = s.chars().next().map_or(0, char::len_utf8);
    &s[..len]
}

/// True when `a` is a one-letter component matching the first letter of `b`.
fn is_initial_of(a: &str, b: &str) -> bool {
    a.chars().nth(1).is_none() && a == initial(b)
}

/// True when the two component lists share a full component or an initial.
fn share_any_component(me: &[&str], it: &[&str]) -> bool {
    me.iter()
        .copied()
        .chain(me.iter().map(|part| initial(part)))
        .any(|x| it.iter().any(|&y| x == y || x == initial(y)))
}

/// Jones-2009 rule: identical first component, same component count, and
/// matching initials for every further component.
fn middle_name_compare(me: &[&str], it: &[&str]) -> Relation {
    if me.len() > 1 && it.len() > 1 && me.len() == it.len() && me[0] == it[0] {
        for k in 1..me.len() {
            if initial(me[k]) != initial(it[k]) {
                return Relation::Different;
            }
        }
        Relation::Equal
    } else {
        Relation::Different
    }
}

/// Match each component of `from` against an unconsumed component of
/// `into`, in any order. `from_is_me` selects which side owns the
/// "initial" labels.
fn free_scan(from: &[&str], into: &[&str], from_is_me: bool) -> Labels {
    let mut labels = Labels::default();
    let mut consumed: SmallVec<[bool; 4]> = SmallVec::from_elem(false, into.len());

    for &first in from {
        let mut found = false;
        for (j, &second) in into.iter().enumerate() {
            if consumed[j] {
                continue;
            }
            if first == second {
                found = true;
            } else if first == initial(second) {
                if from_is_me {
                    labels.me_initial = true;
                } else {
                    labels.it_initial = true;
                }
                found = true;
            } else if initial(first) == second {
                if from_is_me {
                    labels.it_initial = true;
                } else {
                    labels.me_initial = true;
                }
                found = true;
            }
            if found {
                consumed[j] = true;
                break;
            }
        }
        if !found {
            labels.unknown = true;
        }
    }

    labels
}

/// Match the components of `me` against `it` left to right, advancing a
/// cursor past each hit. Returns the labels seen and the number of
/// components that found a counterpart.
fn ordered_scan(me: &[&str], it: &[&str]) -> (Labels, usize) {
    let mut labels = Labels::default();
    let mut matched = 0;
    let mut cursor = 0;

    for &first in me {
        let mut found = false;
        if cursor < it.len() {
            for (j, &second) in it.iter().enumerate().skip(cursor) {
                if first == second {
                    found = true;
                } else if first == initial(second) {
                    labels.me_initial = true;
                    found = true;
                } else if initial(first) == second {
                    labels.it_initial = true;
                    found = true;
                }
                if found {
                    cursor = j + 1;
                    matched += 1;
                    break;
                }
            }
        }
        if !found {
            labels.unknown = true;
        }
    }

    (labels, matched)
}

impl Persons {
    /// Compare two normalized forenames under the configured policy.
    ///
    /// The result is read from the perspective of `me`: `MeSubset` means
    /// `me` carries strictly less information than `it`. `Identical` is
    /// never produced here; that tag is reserved for a name compared
    /// against itself in the relation matrix.
    ///
    /// # Examples
    /// ```
    /// use persons::{Persons, Relation};
    ///
    /// let persons = Persons::new();
    /// assert_eq!(persons.compare("tim", "tim w"), Relation::MeSubset);
    /// assert_eq!(persons.compare("tim w", "tim"), Relation::ItSubset);
    /// assert_eq!(persons.compare("j david", "david"), Relation::Different);
    /// ```
    pub fn compare(&self, me: &str, it: &str) -> Relation {
        if me == it {
            return Relation::Equal;
        }
        if !(self.middle_name_rule || self.match_subsets || self.match_interlaced) {
            return Relation::Different;
        }

        let me_parts: Parts = me.split(' ').collect();
        let it_parts: Parts = it.split(' ').collect();

        // Names sharing neither a full component nor an initial belong to
        // different people.
        if me_parts.len() == 1 && it_parts.len() == 1 && initial(me) != initial(it) {
            return Relation::Different;
        }
        if !share_any_component(&me_parts, &it_parts) {
            return Relation::Different;
        }

        // Common case: equal first forename, second missing or an initial.
        if me_parts.len() < 3
            && it_parts.len() < 3
            && me_parts[0] == it_parts[0]
            && !self.middle_name_rule
        {
            if me_parts.len() == 1 {
                return Relation::MeSubset;
            }
            if it_parts.len() == 1 {
                return Relation::ItSubset;
            }
            if is_initial_of(me_parts[1], it_parts[1]) {
                return Relation::MeSubset;
            }
            if is_initial_of(it_parts[1], me_parts[1]) {
                return Relation::ItSubset;
            }
        }

        if self.middle_name_rule {
            return middle_name_compare(&me_parts, &it_parts);
        }

        if self.ignore_order_of_forenames {
            return free_compare(&me_parts, &it_parts);
        }

        if self.absolute_position_matters {
            for k in 0..me_parts.len().min(it_parts.len()) {
                if initial(me_parts[k]) != initial(it_parts[k]) {
                    return Relation::Different;
                }
            }
        }

        ordered_compare(&me_parts, &it_parts)
    }
}

fn free_compare(me: &[&str], it: &[&str]) -> Relation {
    let me_labels = free_scan(me, it, true);
    let it_labels = free_scan(it, me, false);
    let all = me_labels.union(it_labels);

    if me.len() > it.len() {
        if it_labels.unknown {
            Relation::Different
        } else if all.me_initial {
            Relation::Crossed
        } else {
            Relation::ItSubset
        }
    } else if me.len() < it.len() {
        if me_labels.unknown {
            Relation::Different
        } else if all.it_initial {
            Relation::Crossed
        } else {
            Relation::MeSubset
        }
    } else if !all.unknown && !all.me_initial && !all.it_initial {
        Relation::Equal
    } else if all.unknown {
        Relation::Different
    } else if all.me_initial && all.it_initial {
        Relation::Crossed
    } else if all.me_initial {
        Relation::MeSubset
    } else {
        Relation::ItSubset
    }
}

fn ordered_compare(me: &[&str], it: &[&str]) -> Relation {
    let (labels, matched) = ordered_scan(me, it);

    if me.len() > it.len() {
        // The shorter side still has unmatched components.
        if matched < it.len() {
            Relation::Different
        } else if labels.me_initial {
            Relation::Crossed
        } else {
            Relation::ItSubset
        }
    } else if me.len() < it.len() {
        if labels.unknown {
            Relation::Different
        } else if labels.it_initial {
            Relation::Crossed
        } else {
            Relation::MeSubset
        }
    } else if labels.unknown {
        Relation::Different
    } else if labels.me_initial && labels.it_initial {
        Relation::Crossed
    } else if labels.me_initial {
        Relation::MeSubset
    } else if labels.it_initial {
        Relation::ItSubset
    } else {
        Relation::Equal
    }
}

use bitflags::bitflags;

/// How two forenames within one surname bucket relate, read from the
/// perspective of the first ("me") name.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Relation {
    /// Same node; only ever appears on the matrix diagonal.
    Identical,
    /// The forenames match under the active policy.
    Equal,
    /// "Me" carries strictly less information than "it".
    MeSubset,
    /// "It" carries strictly less information than "me".
    ItSubset,
    /// Compatible, but neither strictly contains the other.
    Crossed,
    /// The names denote distinct people.
    Different,
}

impl Relation {
    /// The same relation seen from the other name's perspective.
    ///
    /// Swaps `MeSubset` and `ItSubset`; everything else is its own mirror.
    pub fn flip(self) -> Relation {
        match self {
            Relation::MeSubset => Relation::ItSubset,
            Relation::ItSubset => Relation::MeSubset,
            other => other,
        }
    }
}

bitflags! {
    /// Why a record ended up in its cluster.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct MatchCodes: u8 {
        /// Forenames compared equal (or the cluster is a singleton).
        const EQUAL = 1;
        /// The cluster contains a subset relationship.
        const VERTICAL = 1 << 1;
        /// The cluster contains a crossed relationship.
        const INTERLACED = 1 << 2;
        /// Separated because the cluster held several known unique persons.
        const MULTIPLE_KNOWN_SEPARATED = 1 << 3;
        /// Left behind when known unique persons were separated out.
        const MOVED_FROM_MULTIPLE_KNOWN = 1 << 4;
        /// The cluster was divided at a year gap.
        const SPLIT_AT_TIME_GAP = 1 << 5;
    }
}

impl MatchCodes {
    /// The single summary reported in output rows.
    pub fn summary(self) -> &'static str {
        if self.contains(MatchCodes::INTERLACED) {
            "interlaced"
        } else if self.contains(MatchCodes::VERTICAL) {
            "vertical"
        } else {
            "equal"
        }
    }
}

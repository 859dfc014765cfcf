//! Component kind tags and the per-kind behavior table

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of diagram element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Stock,
    Flow,
    Parameter,
    Variable,
    SumVariable,
    Connection,
    Cloud,
    StaticModel,
    Substitution,
    Scenario,
    CldVertex,
    CldLink,
    StickyNote,
    LoopIcon,
}

/// How a pointer kind is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRouting {
    /// Not a pointer
    None,
    /// Follows the session routing mode (flows)
    Session,
    /// Always straight unless a handle bends it
    Straight,
}

/// Static behavior of a component kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindInfo {
    /// Wire tag
    pub tag: &'static str,
    /// Payload carries `from`/`to`
    pub pointer: bool,
    /// Anchors are padded outward from the label box
    pub text: bool,
    /// Has a presentation element
    pub visible: bool,
    /// May take part in a substitution
    pub identifiable: bool,
    pub routing: PointerRouting,
}

const fn shape(tag: &'static str, text: bool) -> KindInfo {
    KindInfo {
        tag,
        pointer: false,
        text,
        visible: true,
        identifiable: true,
        routing: PointerRouting::None,
    }
}

const fn pointer(tag: &'static str, routing: PointerRouting) -> KindInfo {
    KindInfo {
        tag,
        pointer: true,
        text: false,
        visible: true,
        identifiable: false,
        routing,
    }
}

const fn directive(tag: &'static str) -> KindInfo {
    KindInfo {
        tag,
        pointer: false,
        text: false,
        visible: false,
        identifiable: false,
        routing: PointerRouting::None,
    }
}

/// Indexed by `ComponentKind as usize`; order must follow the enum
static KIND_TABLE: [KindInfo; 14] = [
    shape("stock", false),
    pointer("flow", PointerRouting::Session),
    shape("parameter", true),
    shape("variable", true),
    shape("sum_variable", true),
    pointer("connection", PointerRouting::Straight),
    shape("cloud", false),
    KindInfo {
        identifiable: false,
        ..shape("static_model", false)
    },
    directive("substitution"),
    directive("scenario"),
    shape("cld_vertex", true),
    pointer("cld_link", PointerRouting::Straight),
    shape("sticky_note", false),
    shape("loop_icon", false),
];

impl ComponentKind {
    pub const ALL: [ComponentKind; 14] = [
        ComponentKind::Stock,
        ComponentKind::Flow,
        ComponentKind::Parameter,
        ComponentKind::Variable,
        ComponentKind::SumVariable,
        ComponentKind::Connection,
        ComponentKind::Cloud,
        ComponentKind::StaticModel,
        ComponentKind::Substitution,
        ComponentKind::Scenario,
        ComponentKind::CldVertex,
        ComponentKind::CldLink,
        ComponentKind::StickyNote,
        ComponentKind::LoopIcon,
    ];

    pub fn info(self) -> &'static KindInfo {
        &KIND_TABLE[self as usize]
    }

    pub fn tag(self) -> &'static str {
        self.info().tag
    }

    /// Look up a kind by its wire tag
    pub fn from_tag(tag: &str) -> Option<ComponentKind> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn is_pointer(self) -> bool {
        self.info().pointer
    }

    pub fn is_text(self) -> bool {
        self.info().text
    }

    pub fn is_visible(self) -> bool {
        self.info().visible
    }

    pub fn is_identifiable(self) -> bool {
        self.info().identifiable
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `ReadableNode` and its component value types (spec §3).

use serde::{Deserialize, Serialize};

use crate::ids::{BackendNodeId, Eid, FrameId, LoaderId, NodeId};

/// Closed set of semantic element kinds a `ReadableNode` can carry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Link,
    Button,
    Input,
    Textarea,
    Select,
    Combobox,
    Checkbox,
    Radio,
    Switch,
    Slider,
    Tab,
    Menuitem,
    Heading,
    Paragraph,
    List,
    Listitem,
    Image,
    Media,
    Table,
    Form,
    Dialog,
    Navigation,
    Section,
    Generic,
}

impl NodeKind {
    /// The interactive set referenced throughout spec §3/§4/§8.
    pub const INTERACTIVE: &'static [NodeKind] = &[
        NodeKind::Link,
        NodeKind::Button,
        NodeKind::Input,
        NodeKind::Textarea,
        NodeKind::Select,
        NodeKind::Combobox,
        NodeKind::Checkbox,
        NodeKind::Radio,
        NodeKind::Switch,
        NodeKind::Slider,
        NodeKind::Tab,
        NodeKind::Menuitem,
    ];

    pub fn is_interactive(self) -> bool {
        Self::INTERACTIVE.contains(&self)
    }
}

/// Closed set of landmark-level page zones (spec §3, GLOSSARY).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Header,
    Nav,
    Main,
    Aside,
    Footer,
    Dialog,
    Search,
    Form,
    Contentinfo,
    Unknown,
}

impl Default for Region {
    fn default() -> Self {
        Region::Unknown
    }
}

impl Region {
    /// Kebab-case name used both in rendered XML and as the EID landmark-path
    /// prefix (spec §4.5).
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Header => "header",
            Region::Nav => "nav",
            Region::Main => "main",
            Region::Aside => "aside",
            Region::Footer => "footer",
            Region::Dialog => "dialog",
            Region::Search => "search",
            Region::Form => "form",
            Region::Contentinfo => "contentinfo",
            Region::Unknown => "unknown",
        }
    }
}

/// Vertical stacking context an element belongs to (GLOSSARY "Layer").
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Main,
    Modal,
    Popover,
    Drawer,
    Portal,
}

impl Default for Layer {
    fn default() -> Self {
        Layer::Main
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Layer::Main => "main",
            Layer::Modal => "modal",
            Layer::Popover => "popover",
            Layer::Drawer => "drawer",
            Layer::Portal => "portal",
        };
        f.write_str(s)
    }
}

/// Where a node sits in the page's semantic structure (spec §3 `where`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Where {
    pub region: Region,
    pub group_id: Option<String>,
    #[serde(default)]
    pub group_path: Vec<String>,
    pub heading_context: Option<String>,
}

/// Viewport-relative bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// Layout facts for a node (spec §3 `layout`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Layout {
    pub bbox: BBox,
    pub display: Option<String>,
    pub positioning: Option<String>,
    pub flow: Option<String>,
    pub screen_zone: Option<String>,
}

/// Interactive-element state snapshot (spec §3 `state`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeState {
    pub visible: bool,
    pub enabled: bool,
    pub checked: Option<bool>,
    pub expanded: Option<bool>,
    pub selected: Option<bool>,
    pub focused: Option<bool>,
    pub required: Option<bool>,
    pub invalid: Option<bool>,
    pub readonly: Option<bool>,
}

/// A single CSS(-ish) selector locator plus its scoping context.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Locators {
    pub primary: String,
    #[serde(default)]
    pub alternates: Vec<String>,
    pub frame_path: Option<Vec<String>>,
    pub shadow_path: Option<Vec<String>>,
}

/// Free-form, optional element attributes (spec §3 `attributes`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Attributes {
    pub input_type: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub href: Option<String>,
    pub alt: Option<String>,
    pub src: Option<String>,
    pub heading_level: Option<u8>,
    pub action: Option<String>,
    pub method: Option<String>,
    pub autocomplete: Option<String>,
    pub role: Option<String>,
    pub test_id: Option<String>,
}

/// One semantic element fused from the DOM/AX/layout trees (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadableNode {
    pub node_id: NodeId,
    pub backend_node_id: BackendNodeId,
    pub frame_id: FrameId,
    pub loader_id: LoaderId,
    pub kind: NodeKind,
    pub label: String,
    pub r#where: Where,
    pub layout: Layout,
    pub state: Option<NodeState>,
    pub find: Option<Locators>,
    pub attributes: Option<Attributes>,
    /// Populated by the Element Identity stage (spec §4.4 step 5); absent
    /// on a freshly extracted, not-yet-identified node.
    pub eid: Option<Eid>,
    /// Layer tag used by the EID algorithm and the Diff Engine's layer
    /// transition detection (spec §4.5, §4.9 step 5).
    pub layer: Layer,
}

impl ReadableNode {
    pub fn is_visible_interactive(&self) -> bool {
        self.kind.is_interactive()
            && self
                .state
                .as_ref()
                .map(|s| s.visible && s.enabled)
                .unwrap_or(false)
    }
}

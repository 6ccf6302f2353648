/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `FactPack` and its sub-reports (spec §3, §4.6).

use serde::{Deserialize, Serialize};

use crate::ids::Eid;
use crate::node::NodeKind;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogDetectionMethod {
    RoleDialog,
    RoleAlertdialog,
    HtmlDialog,
    AriaModal,
    Heuristic,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogType {
    CookieConsent,
    Newsletter,
    AgeGate,
    LoginPrompt,
    Alert,
    Modal,
    Confirm,
    Unknown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogActionRole {
    Primary,
    Secondary,
    Dismiss,
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DialogAction {
    pub eid: Eid,
    pub label: String,
    pub role: DialogActionRole,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectedDialog {
    pub eid: Eid,
    pub method: DialogDetectionMethod,
    pub title: Option<String>,
    pub dialog_type: DialogType,
    pub confidence: f64,
    pub actions: Vec<DialogAction>,
    pub blocking: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldSemanticType {
    Email,
    Password,
    Phone,
    PostalCode,
    Name,
    Address,
    CreditCard,
    Date,
    Search,
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormField {
    pub eid: Eid,
    pub kind: String,
    pub label: String,
    pub input_type: Option<String>,
    pub semantic_type: FieldSemanticType,
    pub required: bool,
    pub invalid: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub has_value: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormPurpose {
    Login,
    Signup,
    Checkout,
    Contact,
    Search,
    Newsletter,
    Shipping,
    Billing,
    Profile,
    PasswordReset,
    Generic,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectedForm {
    pub group_id: Option<String>,
    pub fields: Vec<FormField>,
    pub submit: Option<Eid>,
    pub purpose: FormPurpose,
    pub purpose_confidence: f64,
    pub required_unfilled_count: usize,
    pub invalid_count: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    Login,
    Signup,
    Checkout,
    ProductListing,
    ProductDetail,
    Search,
    Article,
    Home,
    Cart,
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageClassification {
    pub r#type: PageType,
    pub confidence: f64,
    pub signals: Vec<String>,
    pub entities: Vec<String>,
    pub has_forms: bool,
    pub has_navigation: bool,
    pub has_main_content: bool,
    pub has_search: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionCategory {
    PrimaryCta,
    SecondaryCta,
    Navigation,
    FormSubmit,
    Search,
    CartAction,
    AuthAction,
    DialogAction,
    MediaControl,
    Generic,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredAction {
    pub eid: Eid,
    pub label: String,
    pub kind: NodeKind,
    pub score: f64,
    pub category: ActionCategory,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FactPackMeta {
    pub node_count: usize,
    pub has_blocking_dialog: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FactPack {
    pub page_type: PageClassification,
    pub dialogs: Vec<DetectedDialog>,
    pub forms: Vec<DetectedForm>,
    pub actions: Vec<ScoredAction>,
    pub meta: FactPackMeta,
}

impl FactPack {
    pub fn has_blocking_dialog(&self) -> bool {
        self.dialogs.iter().any(|d| d.blocking)
    }

    pub fn primary_cta(&self) -> Option<&ScoredAction> {
        self.actions
            .iter()
            .find(|a| {
                matches!(
                    a.category,
                    ActionCategory::PrimaryCta
                        | ActionCategory::CartAction
                        | ActionCategory::FormSubmit
                        | ActionCategory::AuthAction
                )
            })
            .or_else(|| {
                self.actions
                    .iter()
                    .filter(|a| a.kind == NodeKind::Button)
                    .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
            })
    }
}

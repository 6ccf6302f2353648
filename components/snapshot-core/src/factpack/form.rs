/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Form detector (spec §4.6).

use snapshot_traits::factpack::{DetectedForm, FieldSemanticType, FormField, FormPurpose};
use snapshot_traits::node::NodeKind;
use snapshot_traits::{BaseSnapshot, ReadableNode};

const FIELD_KINDS: &[NodeKind] = &[
    NodeKind::Input,
    NodeKind::Textarea,
    NodeKind::Select,
    NodeKind::Combobox,
    NodeKind::Checkbox,
    NodeKind::Radio,
];

struct SemanticPattern {
    semantic_type: FieldSemanticType,
    input_types: &'static [&'static str],
    autocomplete: &'static [&'static str],
    tokens: &'static [&'static str],
}

const SEMANTIC_PATTERNS: &[SemanticPattern] = &[
    SemanticPattern {
        semantic_type: FieldSemanticType::Email,
        input_types: &["email"],
        autocomplete: &["email"],
        tokens: &["email", "e-mail"],
    },
    SemanticPattern {
        semantic_type: FieldSemanticType::Password,
        input_types: &["password"],
        autocomplete: &["current-password", "new-password"],
        tokens: &["password", "pwd"],
    },
    SemanticPattern {
        semantic_type: FieldSemanticType::Phone,
        input_types: &["tel"],
        autocomplete: &["tel"],
        tokens: &["phone", "mobile", "telephone"],
    },
    SemanticPattern {
        semantic_type: FieldSemanticType::PostalCode,
        input_types: &[],
        autocomplete: &["postal-code"],
        tokens: &["zip", "postal", "postcode"],
    },
    SemanticPattern {
        semantic_type: FieldSemanticType::Name,
        input_types: &[],
        autocomplete: &["name", "given-name", "family-name"],
        tokens: &["firstname", "lastname", "fullname", "full name", "first name", "last name"],
    },
    SemanticPattern {
        semantic_type: FieldSemanticType::Address,
        input_types: &[],
        autocomplete: &["street-address", "address-line1", "address-line2"],
        tokens: &["address", "street", "city"],
    },
    SemanticPattern {
        semantic_type: FieldSemanticType::CreditCard,
        input_types: &[],
        autocomplete: &["cc-number", "cc-exp", "cc-csc"],
        tokens: &["card number", "cvv", "cvc", "expiry"],
    },
    SemanticPattern {
        semantic_type: FieldSemanticType::Date,
        input_types: &["date"],
        autocomplete: &["bday"],
        tokens: &["date", "birthday", "dob"],
    },
    SemanticPattern {
        semantic_type: FieldSemanticType::Search,
        input_types: &["search"],
        autocomplete: &[],
        tokens: &["search"],
    },
];

/// Groups fields by enclosing form and infers purpose (spec §4.6 "Form
/// detector"). Runs over the whole snapshot rather than the Query Engine
/// because grouping keys need every field's `group_id` together, not a
/// single predicate.
pub fn detect(snapshot: &BaseSnapshot) -> Vec<DetectedForm> {
    let mut groups: Vec<Option<String>> = Vec::new();
    for node in &snapshot.nodes {
        if is_field(node.kind) && !groups.contains(&node.r#where.group_id) {
            groups.push(node.r#where.group_id.clone());
        }
    }

    groups
        .into_iter()
        .map(|group_id| build_form(snapshot, group_id))
        .collect()
}

fn is_field(kind: NodeKind) -> bool {
    FIELD_KINDS.contains(&kind)
}

fn build_form(snapshot: &BaseSnapshot, group_id: Option<String>) -> DetectedForm {
    let field_nodes: Vec<&ReadableNode> = snapshot
        .nodes
        .iter()
        .filter(|n| is_field(n.kind) && n.r#where.group_id == group_id)
        .collect();

    let fields: Vec<FormField> = field_nodes
        .iter()
        .filter_map(|n| n.eid.clone().map(|eid| to_form_field(n, eid)))
        .collect();

    let submit = snapshot
        .nodes
        .iter()
        .find(|n| {
            n.kind == NodeKind::Button
                && n.r#where.group_id == group_id
                && looks_like_submit(&n.label)
        })
        .and_then(|n| n.eid.clone());

    let (purpose, purpose_confidence) = infer_purpose(&fields, &submit_label(snapshot, &submit));
    let required_unfilled_count = fields.iter().filter(|f| f.required && !f.has_value).count();
    let invalid_count = fields.iter().filter(|f| f.invalid).count();

    DetectedForm {
        group_id,
        fields,
        submit,
        purpose,
        purpose_confidence,
        required_unfilled_count,
        invalid_count,
    }
}

fn submit_label(snapshot: &BaseSnapshot, submit: &Option<snapshot_traits::Eid>) -> String {
    submit
        .as_ref()
        .and_then(|eid| snapshot.find_by_eid(eid))
        .map(|n| n.label.to_lowercase())
        .unwrap_or_default()
}

fn looks_like_submit(label: &str) -> bool {
    let lower = label.to_lowercase();
    ["submit", "sign in", "sign up", "log in", "continue", "checkout", "send", "save", "register", "subscribe"]
        .iter()
        .any(|w| lower.contains(w))
}

fn to_form_field(node: &ReadableNode, eid: snapshot_traits::Eid) -> FormField {
    let attrs = node.attributes.as_ref();
    let input_type = attrs.and_then(|a| a.input_type.clone());
    let autocomplete = attrs.and_then(|a| a.autocomplete.clone()).unwrap_or_default();
    let state = node.state.clone().unwrap_or_default();

    FormField {
        eid,
        kind: format!("{:?}", node.kind).to_lowercase(),
        label: node.label.clone(),
        input_type: input_type.clone(),
        semantic_type: infer_field_type(input_type.as_deref(), &autocomplete, &node.label),
        required: state.required.unwrap_or(false),
        invalid: state.invalid.unwrap_or(false),
        disabled: !state.enabled,
        readonly: state.readonly.unwrap_or(false),
        has_value: attrs
            .and_then(|a| a.value.as_deref())
            .map(|v| !v.is_empty())
            .unwrap_or(false),
    }
}

fn infer_field_type(input_type: Option<&str>, autocomplete: &str, label: &str) -> FieldSemanticType {
    let label_lower = label.to_lowercase();
    let autocomplete_lower = autocomplete.to_lowercase();
    SEMANTIC_PATTERNS
        .iter()
        .find(|p| {
            input_type.map(|t| p.input_types.contains(&t)).unwrap_or(false)
                || p.autocomplete.iter().any(|a| autocomplete_lower == *a)
                || p.tokens.iter().any(|t| label_lower.contains(t))
        })
        .map(|p| p.semantic_type)
        .unwrap_or(FieldSemanticType::Unknown)
}

fn infer_purpose(fields: &[FormField], submit_label: &str) -> (FormPurpose, f64) {
    let has = |t: FieldSemanticType| fields.iter().any(|f| f.semantic_type == t);
    let only_one_field = fields.len() == 1;

    if has(FieldSemanticType::Email) && has(FieldSemanticType::Password) {
        if submit_label.contains("sign up") || submit_label.contains("register") || submit_label.contains("create") {
            return (FormPurpose::Signup, 0.85);
        }
        return (FormPurpose::Login, 0.85);
    }
    if has(FieldSemanticType::Password) && fields.len() <= 2 && submit_label.contains("reset") {
        return (FormPurpose::PasswordReset, 0.7);
    }
    if has(FieldSemanticType::CreditCard) || submit_label.contains("checkout") || submit_label.contains("pay") {
        return (FormPurpose::Checkout, 0.75);
    }
    if has(FieldSemanticType::Address) && has(FieldSemanticType::Name) {
        return (FormPurpose::Shipping, 0.6);
    }
    if only_one_field && has(FieldSemanticType::Search) {
        return (FormPurpose::Search, 0.8);
    }
    if only_one_field && has(FieldSemanticType::Email) && submit_label.contains("subscribe") {
        return (FormPurpose::Newsletter, 0.7);
    }
    if submit_label.contains("subscribe") {
        return (FormPurpose::Newsletter, 0.55);
    }
    if has(FieldSemanticType::Name) && fields.iter().any(|f| f.kind == "textarea") {
        return (FormPurpose::Contact, 0.6);
    }
    if submit_label.contains("save") && has(FieldSemanticType::Name) {
        return (FormPurpose::Profile, 0.5);
    }
    (FormPurpose::Generic, 0.3)
}

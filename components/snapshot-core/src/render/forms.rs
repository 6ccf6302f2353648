/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `<forms>` section renderer. The truncated form collapses each form's
//! field list down to a "N fields (K required)" count (spec §4.10).

use snapshot_traits::factpack::{DetectedForm, FactPack, FieldSemanticType, FormField, FormPurpose};

use super::xml::escape_xml;
use super::Section;

const PRIORITY: i32 = 2;

pub fn render(fact_pack: &FactPack) -> Section {
    if fact_pack.forms.is_empty() {
        return Section {
            name: "forms",
            content: String::new(),
            truncated_content: String::new(),
            can_truncate: true,
            truncation_priority: PRIORITY,
            blocking: false,
        };
    }

    let full: String = fact_pack.forms.iter().map(render_full).collect();
    let short: String = fact_pack.forms.iter().map(render_short).collect();

    Section {
        name: "forms",
        content: format!("<forms>{full}</forms>"),
        truncated_content: format!("<forms>{short}</forms>"),
        can_truncate: true,
        truncation_priority: PRIORITY,
        blocking: false,
    }
}

fn render_full(form: &DetectedForm) -> String {
    let fields: String = form.fields.iter().map(render_field).collect();
    let submit = form
        .submit
        .as_ref()
        .map(|eid| format!(" submit=\"{}\"", escape_xml(&eid.0)))
        .unwrap_or_default();
    format!(
        "<form group=\"{}\" purpose=\"{}\" confidence=\"{:.2}\" required_unfilled=\"{}\" invalid=\"{}\"{}>{}</form>",
        escape_xml(group_label(form)),
        purpose_str(form.purpose),
        form.purpose_confidence,
        form.required_unfilled_count,
        form.invalid_count,
        submit,
        fields,
    )
}

fn render_short(form: &DetectedForm) -> String {
    let required = form.fields.iter().filter(|field| field.required).count();
    format!(
        "<form group=\"{}\" purpose=\"{}\">{} fields ({} required)</form>",
        escape_xml(group_label(form)),
        purpose_str(form.purpose),
        form.fields.len(),
        required,
    )
}

fn group_label(form: &DetectedForm) -> &str {
    form.group_id.as_deref().unwrap_or("")
}

fn render_field(field: &FormField) -> String {
    format!(
        "<field eid=\"{}\" kind=\"{}\" semantic=\"{}\" required=\"{}\" invalid=\"{}\" disabled=\"{}\" readonly=\"{}\" has_value=\"{}\">{}</field>",
        escape_xml(&field.eid.0),
        escape_xml(&field.kind),
        semantic_type_str(field.semantic_type),
        field.required,
        field.invalid,
        field.disabled,
        field.readonly,
        field.has_value,
        escape_xml(&field.label),
    )
}

fn purpose_str(purpose: FormPurpose) -> &'static str {
    match purpose {
        FormPurpose::Login => "login",
        FormPurpose::Signup => "signup",
        FormPurpose::Checkout => "checkout",
        FormPurpose::Contact => "contact",
        FormPurpose::Search => "search",
        FormPurpose::Newsletter => "newsletter",
        FormPurpose::Shipping => "shipping",
        FormPurpose::Billing => "billing",
        FormPurpose::Profile => "profile",
        FormPurpose::PasswordReset => "password-reset",
        FormPurpose::Generic => "generic",
    }
}

fn semantic_type_str(kind: FieldSemanticType) -> &'static str {
    match kind {
        FieldSemanticType::Email => "email",
        FieldSemanticType::Password => "password",
        FieldSemanticType::Phone => "phone",
        FieldSemanticType::PostalCode => "postal-code",
        FieldSemanticType::Name => "name",
        FieldSemanticType::Address => "address",
        FieldSemanticType::CreditCard => "credit-card",
        FieldSemanticType::Date => "date",
        FieldSemanticType::Search => "search",
        FieldSemanticType::Unknown => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot_traits::factpack::FactPackMeta;
    use snapshot_traits::factpack::PageClassification;
    use snapshot_traits::factpack::PageType;
    use snapshot_traits::Eid;

    fn login_form() -> DetectedForm {
        DetectedForm {
            group_id: Some("form-1".to_string()),
            fields: vec![
                FormField {
                    eid: Eid("f1".to_string()),
                    kind: "input".to_string(),
                    label: "Email".to_string(),
                    input_type: Some("email".to_string()),
                    semantic_type: FieldSemanticType::Email,
                    required: true,
                    invalid: false,
                    disabled: false,
                    readonly: false,
                    has_value: false,
                },
                FormField {
                    eid: Eid("f2".to_string()),
                    kind: "input".to_string(),
                    label: "Password".to_string(),
                    input_type: Some("password".to_string()),
                    semantic_type: FieldSemanticType::Password,
                    required: true,
                    invalid: false,
                    disabled: false,
                    readonly: false,
                    has_value: false,
                },
            ],
            submit: Some(Eid("f3".to_string())),
            purpose: FormPurpose::Login,
            purpose_confidence: 0.85,
            required_unfilled_count: 2,
            invalid_count: 0,
        }
    }

    fn pack(form: DetectedForm) -> FactPack {
        FactPack {
            page_type: PageClassification {
                r#type: PageType::Login,
                confidence: 0.8,
                signals: vec![],
                entities: vec![],
                has_forms: true,
                has_navigation: false,
                has_main_content: true,
                has_search: false,
            },
            dialogs: vec![],
            forms: vec![form],
            actions: vec![],
            meta: FactPackMeta { node_count: 3, has_blocking_dialog: false },
        }
    }

    #[test]
    fn short_form_collapses_fields_to_a_count() {
        let section = render(&pack(login_form()));
        assert!(section.content.contains("<field"));
        assert!(section.truncated_content.contains("2 fields (2 required)"));
        assert!(!section.truncated_content.contains("<field"));
    }
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `<dialogs>` section renderer. The truncated form drops each dialog's
//! action list; a blocking dialog is never truncated at all (spec §4.10).

use snapshot_traits::factpack::{DetectedDialog, DialogActionRole, DialogDetectionMethod, DialogType, FactPack};

use super::xml::escape_xml;
use super::Section;

const PRIORITY: i32 = 3;

pub fn render(fact_pack: &FactPack) -> Section {
    if fact_pack.dialogs.is_empty() {
        return empty_section();
    }

    let full: String = fact_pack.dialogs.iter().map(render_full).collect();
    let short: String = fact_pack.dialogs.iter().map(render_short).collect();

    Section {
        name: "dialogs",
        content: format!("<dialogs>{full}</dialogs>"),
        truncated_content: format!("<dialogs>{short}</dialogs>"),
        can_truncate: !fact_pack.meta.has_blocking_dialog,
        truncation_priority: PRIORITY,
        blocking: fact_pack.meta.has_blocking_dialog,
    }
}

fn empty_section() -> Section {
    Section {
        name: "dialogs",
        content: String::new(),
        truncated_content: String::new(),
        can_truncate: true,
        truncation_priority: PRIORITY,
        blocking: false,
    }
}

fn render_full(dialog: &DetectedDialog) -> String {
    let title = title_xml(dialog);
    let actions: String = dialog
        .actions
        .iter()
        .map(|action| {
            format!(
                "<action eid=\"{}\" role=\"{}\">{}</action>",
                escape_xml(&action.eid.0),
                action_role_str(action.role),
                escape_xml(&action.label),
            )
        })
        .collect();
    format!(
        "<dialog eid=\"{}\" method=\"{}\" type=\"{}\" confidence=\"{:.2}\" blocking=\"{}\">{}{}</dialog>",
        escape_xml(&dialog.eid.0),
        method_str(dialog.method),
        dialog_type_str(dialog.dialog_type),
        dialog.confidence,
        dialog.blocking,
        title,
        actions,
    )
}

fn render_short(dialog: &DetectedDialog) -> String {
    format!(
        "<dialog eid=\"{}\" type=\"{}\" blocking=\"{}\">{}</dialog>",
        escape_xml(&dialog.eid.0),
        dialog_type_str(dialog.dialog_type),
        dialog.blocking,
        title_xml(dialog),
    )
}

fn title_xml(dialog: &DetectedDialog) -> String {
    dialog
        .title
        .as_deref()
        .map(|title| format!("<title>{}</title>", escape_xml(title)))
        .unwrap_or_default()
}

fn method_str(method: DialogDetectionMethod) -> &'static str {
    match method {
        DialogDetectionMethod::RoleDialog => "role-dialog",
        DialogDetectionMethod::RoleAlertdialog => "role-alertdialog",
        DialogDetectionMethod::HtmlDialog => "html-dialog",
        DialogDetectionMethod::AriaModal => "aria-modal",
        DialogDetectionMethod::Heuristic => "heuristic",
    }
}

fn dialog_type_str(kind: DialogType) -> &'static str {
    match kind {
        DialogType::CookieConsent => "cookie-consent",
        DialogType::Newsletter => "newsletter",
        DialogType::AgeGate => "age-gate",
        DialogType::LoginPrompt => "login-prompt",
        DialogType::Alert => "alert",
        DialogType::Modal => "modal",
        DialogType::Confirm => "confirm",
        DialogType::Unknown => "unknown",
    }
}

fn action_role_str(role: DialogActionRole) -> &'static str {
    match role {
        DialogActionRole::Primary => "primary",
        DialogActionRole::Secondary => "secondary",
        DialogActionRole::Dismiss => "dismiss",
        DialogActionRole::Unknown => "unknown",
    }
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! State Manager + Response Builder: per-page lifecycle wrapping the
//! snapshot/diff/observation/FactPack pipeline into the `<state>`,
//! `<result>`, and `<error>` XML the agent reads back.

pub mod page;
pub mod response;

pub use page::{PageHealth, PageState};
pub use response::{
    render_close_page, render_close_session, render_element_details, render_error, render_error_for,
    render_error_with_state, render_find_elements, render_list_pages, render_state, PageSummary,
};

use dioxus::prelude::*;

use crate::io::state_store;
use crate::state::patterns::PatternKind;
use crate::ui::actions::GridHandle;
use crate::ui::add_modal::AddModal;
use crate::ui::patterns::PatternBar;
use crate::ui::table::Table;
use crate::ui::toolbar::ActionBar;
use crate::ui::{sanitize_id, PendingViews, Services};

/// One form's grid: hydrates once, then renders from its signals.
#[component]
pub fn Grid(form_name: String, hidden: bool) -> Element {
    let services = use_context::<Services>();
    let pending = try_use_context::<PendingViews>();
    let grid = use_hook({
        let form_name = form_name.clone();
        move || GridHandle::new(&form_name)
    });
    use_drop(move || grid.flush_on_unmount());
    let initial_view = use_hook({
        let form_name = form_name.clone();
        move || pending.and_then(|PendingViews(mut views)| views.write().remove(&form_name))
    });

    let loaded = use_resource({
        let services = services.clone();
        let form_name = form_name.clone();
        move || {
            let services = services.clone();
            let form_name = form_name.clone();
            let initial_view = initial_view.clone();
            async move {
                let loaded =
                    state_store::load_grid(services.backend.as_ref(), &form_name, initial_view)
                        .await
                        .map_err(|err| err.to_string())?;
                grid.install(&services, loaded);
                Ok::<(), String>(())
            }
        }
    });

    let class = if hidden { "grid grid-hidden" } else { "grid" };

    let body = match &*loaded.read() {
        None => rsx! {
            p { class: "loading-message", "Loading {form_name}…" }
        },
        Some(Err(err)) => rsx! {
            p { class: "error-message", id: "grid-load-error", "Could not load {form_name}: {err}" }
        },
        Some(Ok(())) => rsx! {
            ActionBar { grid }
            div { class: "pattern-bars",
                PatternBar { grid, kind: PatternKind::Searchpattern }
                PatternBar { grid, kind: PatternKind::Layout }
            }
            Table { grid }
            if grid.form.read().is_some() {
                AddModal { grid }
            }
        },
    };

    rsx! {
        div { class: "{class}", id: format!("grid-{}", sanitize_id(&form_name)), {body} }
    }
}

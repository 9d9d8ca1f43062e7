use std::collections::BTreeMap;

use dioxus::prelude::*;

use crate::config::AppConfig;
use crate::ui::grid::Grid;
use crate::ui::patterns::SessionBar;
use crate::ui::{LiveViews, PendingViews, Services};

const STYLES: Asset = asset!("/assets/styles.css");

#[component]
pub fn App() -> Element {
    let services = use_hook(|| {
        let config = AppConfig::from_env().map_err(|err| err.to_string())?;
        let backend = config.backend().map_err(|err| err.to_string())?;
        Ok::<_, String>(Services::new(backend, config))
    });

    let body = match services {
        Ok(services) => rsx! {
            Workspace { services }
        },
        Err(err) => rsx! {
            div { class: "app",
                p { class: "error-message", id: "startup-error", "{err}" }
            }
        },
    };

    rsx! {
        document::Stylesheet { href: STYLES }
        {body}
    }
}

/// Tab strip over the configured forms. Every open tab keeps its grid
/// mounted; inactive ones are only hidden.
#[component]
fn Workspace(services: Services) -> Element {
    use_context_provider(|| services.clone());
    let LiveViews(mut live) = use_context_provider(|| LiveViews(Signal::new(BTreeMap::new())));
    use_context_provider(|| PendingViews(Signal::new(BTreeMap::new())));

    let forms = services.config.forms.clone();
    let mut open_tabs = use_signal(|| forms.first().cloned().into_iter().collect::<Vec<_>>());
    let mut active_tab = use_signal(|| forms.first().cloned());
    let epoch = use_signal(|| 0u64);

    let open = open_tabs.read().clone();
    let active = active_tab.read().clone();
    let generation = *epoch.read();

    rsx! {
        div { class: "app",
            div { class: "tab-strip", id: "tab-strip",
                for form in forms.iter().cloned() {
                    {
                        let is_open = open.contains(&form);
                        let class = match (is_open, active.as_deref() == Some(form.as_str())) {
                            (true, true) => "tab tab-active",
                            (true, false) => "tab tab-open",
                            _ => "tab",
                        };
                        rsx! {
                            div { key: "{form}", class: "{class}",
                                span {
                                    class: "tab-label",
                                    onclick: {
                                        let form = form.clone();
                                        move |_| {
                                            if !open_tabs.peek().contains(&form) {
                                                open_tabs.write().push(form.clone());
                                            }
                                            active_tab.set(Some(form.clone()));
                                        }
                                    },
                                    "{form}"
                                }
                                if is_open {
                                    button {
                                        class: "tab-close",
                                        onclick: {
                                            let form = form.clone();
                                            move |evt: MouseEvent| {
                                                evt.stop_propagation();
                                                open_tabs.write().retain(|tab| tab != &form);
                                                if active_tab.peek().as_deref() == Some(form.as_str()) {
                                                    let next = open_tabs.peek().first().cloned();
                                                    active_tab.set(next);
                                                }
                                                live.write().remove(&form);
                                            }
                                        },
                                        "\u{2715}"
                                    }
                                }
                            }
                        }
                    }
                }
            }
            SessionBar { forms: forms.clone(), open_tabs, active_tab, epoch }
            if open.is_empty() {
                p { class: "empty-message", "Open a form from the tabs above." }
            }
            for form in open.iter().cloned() {
                Grid {
                    key: "{form}-{generation}",
                    hidden: active.as_deref() != Some(form.as_str()),
                    form_name: form,
                }
            }
        }
    }
}

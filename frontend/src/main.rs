mod api;
mod client;
mod components;
mod controller;
mod error;
mod framing;
mod models;
mod sink;
mod state;
mod transport;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::chat::ChatPanel;
use state::ChatState;

/// Root application component.
#[component]
fn App() -> impl IntoView {
    ChatState::provide();

    view! {
        <div class="app-container">
            <ChatPanel />
        </div>
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}

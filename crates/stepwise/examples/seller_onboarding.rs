//! Seller onboarding wizard driven from a scripted "user".
//!
//! Demonstrates:
//! - Field-level gating through a form binding plus a custom async validator
//! - A `before_next` hook calling out to a (simulated) backend
//! - An optional step the user skips
//! - A step only visible to sellers
//! - Form data persisted to disk and restored on the next run

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use stepwise::prelude::*;

/// Stand-in for a shop-name availability lookup.
struct ShopNameAvailable;

#[async_trait]
impl Validator for ShopNameAvailable {
    async fn validate(&self, data: &FormData) -> bool {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let taken = ["admin", "shop"];
        data.get("shop_name")
            .and_then(|v| v.as_str())
            .is_some_and(|name| !taken.contains(&name.to_lowercase().as_str()))
    }
}

fn render(wizard: &Wizard) {
    let state = wizard.state();
    let visible = wizard.visible_steps();
    let line: Vec<String> = wizard
        .steps()
        .iter()
        .enumerate()
        .filter(|(i, _)| visible.contains(i))
        .map(|(i, step)| {
            let marker = if i == state.current_step {
                ">"
            } else if state.is_visited(i) {
                "*"
            } else {
                " "
            };
            format!("{marker}{}", step.title())
        })
        .collect();
    println!("[{}] next enabled: {}", line.join(" | "), state.can_go_next);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let state_dir = std::env::temp_dir().join("stepwise-demo");

    let wizard = Wizard::builder()
        .step(Step::new("account", "Account").fields(["email", "password"]))
        .step(Step::new("role", "Role").fields(["role"]))
        .step(
            Step::new("shop", "Shop")
                .fields(["shop_name"])
                .validator(ShopNameAvailable)
                .visible_when(|data| data.get("role") == Some(&json!("seller")))
                .on_before_next_with(|data: FormData| async move {
                    println!("Reserving shop name {:?}", data.get("shop_name"));
                    Ok::<(), BoxError>(())
                }),
        )
        .step(Step::new("newsletter", "Newsletter").optional().fields(["topics"]))
        .step(Step::new("review", "Review"))
        .form_binding(RequiredFields)
        .persistence(JsonFileStore::new(&state_dir))
        .storage_key("seller-onboarding")
        .on_complete_with(|data: FormData| async move {
            println!("Submitting onboarding: {}", serde_json::to_string(&data)?);
            Ok::<(), BoxError>(())
        })
        .build()
        .await?;

    if !wizard.form_data().is_empty() {
        println!("Resumed with {} saved fields", wizard.form_data().len());
    }
    render(&wizard);

    // Missing password: blocked.
    wizard
        .update_form_data(FormData::new().with("email", "alice@example.com"))
        .await;
    println!("next -> {:?}", wizard.next_step().await?);
    render(&wizard);

    wizard
        .update_form_data(FormData::new().with("password", "correct horse"))
        .await;
    println!("next -> {:?}", wizard.next_step().await?);

    wizard.update_form_data(FormData::new().with("role", "seller")).await;
    println!("next -> {:?}", wizard.next_step().await?);
    render(&wizard);

    // Taken shop name, then a free one.
    wizard
        .update_form_data(FormData::new().with("shop_name", "Shop"))
        .await;
    println!("next -> {:?}", wizard.next_step().await?);
    wizard
        .update_form_data(FormData::new().with("shop_name", "Kyoto Indigo"))
        .await;
    println!("next -> {:?}", wizard.next_step().await?);

    println!("skip -> {:?}", wizard.skip_step().await?);
    render(&wizard);

    println!("jump -> {:?}", wizard.go_to_step(0));
    println!("jump -> {:?}", wizard.go_to_step(4));
    println!("next -> {:?}", wizard.next_step().await?);

    Ok(())
}

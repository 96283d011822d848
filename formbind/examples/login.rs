//! Login Form Example
//!
//! A demo wiring a login form to the reactive engine:
//! - Default extraction and initial values
//! - Synchronous validation with per-field messages
//! - Store subscriptions driving console output
//! - A full submission round trip, failing first, then succeeding

use std::fs::File;

use formbind::prelude::*;
use formdom::{Element, EventKind, InputType};
use log::LevelFilter;
use simplelog::{Config, WriteLogger};

fn required(data: &Data, field: &str, errors: &mut Errors) {
    let path = FieldPath::parse(field);
    let empty = match data.get(&path) {
        Some(FieldNode::Leaf(FieldValue::Text(s))) => s.is_empty(),
        _ => true,
    };
    if empty {
        errors.set_leaf(&path, vec![format!("{field} is required")]);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create("login-example.log")?,
    );

    let email = Element::text_input("email").id("email");
    let password = Element::input(InputType::Password)
        .name("password")
        .id("password");
    let remember = Element::checkbox("remember", "yes");
    let form = Element::form()
        .child(email.clone())
        .child(password.clone())
        .child(remember.clone());

    let handle = bind(
        &form,
        FormConfig::new()
            .validate(|data| {
                let mut errors = Errors::map();
                required(data, "email", &mut errors);
                required(data, "password", &mut errors);
                Some(errors)
            })
            .on_submit(|data, _cx| async move {
                println!("submitting {}", data.to_json());
                Ok(())
            }),
    )?;

    let _data_sub = handle
        .stores()
        .data
        .subscribe(|data| println!("data: {}", data.to_json()));
    let _valid_sub = handle
        .stores()
        .is_valid()
        .subscribe(|valid| println!("valid: {valid}"));

    // Submitting the empty form is blocked by validation.
    handle.submit().await?;
    println!(
        "email message: {:?}",
        email.get_data("validation-message")
    );

    // Type into the fields the way a user would.
    email.set_value("user@example.com");
    email.emit(EventKind::Input);
    password.set_value("hunter2");
    password.emit(EventKind::Input);
    remember.set_checked(true);
    remember.emit(EventKind::Change);

    // Now the pipeline reaches the handler.
    handle.submit().await?;

    handle.destroy();
    Ok(())
}

use serde::{Deserialize, Serialize};
use state_manager::prelude::*;

#[derive(Debug, Serialize, Deserialize)]
struct Address {
    city: String,
    zip: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Profile {
    name: String,
    email: String,
    address: Address,
    tags: Vec<String>,
    submitted: bool,
}

fn profile_form(composition: &Composition, initial: &Record) -> Manager {
    composition.run(|| {
        use_manager_with_config(
            || initial.clone(),
            ManagerConfig::new()
                .label("profile")
                .reset_policy(ResetPolicy::RestoreInitial),
        )
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let initial = Record::from_typed(&Profile {
        name: "Ada".into(),
        email: "ada@example.com".into(),
        address: Address {
            city: "London".into(),
            zip: "N1".into(),
        },
        tags: vec!["math".into()],
        submitted: false,
    })?;

    let composition = Composition::new();
    let form = profile_form(&composition, &initial);
    composition.run(|| {
        form.subscribe(|state| log::info!("profile changed: {state}"));
    });

    form.update_state("name", "Ada Lovelace");
    form.deep_update_state("address.city", "Marylebone");
    form.deep_update_state("tags[1]", "engines");
    form.update_state("name", "Ada Lovelace");
    form.bulk_update(record! { "submitted" => true, "email" => "ada@analytical.engine" });

    // Re-evaluation hands back the same manager.
    let again = profile_form(&composition, &initial);
    assert!(again.ptr_eq(&form));

    let submitted: Profile = form.state().to_typed()?;
    println!("submitted after {} change(s): {submitted:?}", form.version());

    form.reset_state(None);
    let cleared: Profile = form.state().to_typed()?;
    println!("after reset: {cleared:?}");

    composition.dispose();
    Ok(())
}

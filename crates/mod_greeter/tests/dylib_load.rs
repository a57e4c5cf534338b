use mod_api::{EventBus, ModPostInitEvent, MOD_POST_INIT};
use mod_greeter::{GreetingEvent, GREETER_ID};
use mod_loader::testing::ZipFixture;
use mod_loader::{DylibLoader, LoaderConfig, ModLoader};
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// The greeter cdylib cargo built next to this test binary.
fn greeter_library() -> PathBuf {
    let file_name = format!("{}mod_greeter{}", DLL_PREFIX, DLL_SUFFIX);
    let exe = std::env::current_exe().unwrap();
    exe.ancestors()
        .skip(1)
        .take(2)
        .map(|dir| dir.join(&file_name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| panic!("{} not found near {}", file_name, exe.display()))
}

#[test]
fn greeter_library_loads_and_runs_every_stage() {
    let library = greeter_library();
    let entry_name = library.file_name().unwrap().to_str().unwrap().to_string();
    let dir = tempfile::tempdir().unwrap();
    ZipFixture::new()
        .stored(&entry_name, &std::fs::read(&library).unwrap())
        .write_to(&dir.path().join("greeter.zip"))
        .unwrap();

    let events = Arc::new(EventBus::new());
    let greetings = Arc::new(Mutex::new(Vec::new()));
    let sink = greetings.clone();
    events
        .on_mod(GREETER_ID, "greeting", move |event: GreetingEvent| {
            sink.lock().unwrap().push(event);
            Ok(())
        })
        .unwrap();
    let post_init = Arc::new(Mutex::new(0));
    let seen = post_init.clone();
    events
        .on_core(MOD_POST_INIT, move |_: ModPostInitEvent| {
            *seen.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();

    let mut loader = ModLoader::new(LoaderConfig::new([0, 3, 0]), events.clone());
    // Pre-init fails unless the greeter was handed its own instance.
    loader.load(dir.path(), &DylibLoader::new()).unwrap();

    assert_eq!(loader.mods().len(), 1);
    assert_eq!(loader.mods()[0].id(), GREETER_ID);
    assert!(loader.report().is_clean());

    let greetings = greetings.lock().unwrap().clone();
    assert_eq!(greetings.len(), 1);
    assert_eq!(greetings[0].host_version, "0.3.0");
    assert_eq!(greetings[0].mod_count, 1);
    assert_eq!(*post_init.lock().unwrap(), 1);

    // Handlers go before the libraries that may own them.
    drop(events);
    drop(loader);
}

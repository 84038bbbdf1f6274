/// Prints where the native BERT library would be loaded from.
/// Honors BERT_LIBRARY_PATH and BERT_LIBRARY_DIRS.
use bert_loader::{LibraryConfig, LibraryLoader, Platform};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LibraryConfig::from_env();
    config.validate()?;

    let platform = Platform::current();
    println!(
        "Looking for {} ({:?})",
        platform.library_file_name(&config.library_name),
        platform
    );

    let loader = LibraryLoader::new(config);
    match loader.locate() {
        Ok(path) => println!("Found: {}", path.display()),
        Err(e) => println!("{}", e),
    }

    Ok(())
}

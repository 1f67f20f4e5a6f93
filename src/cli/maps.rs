//! Map listing and validation command implementation.

use super::CliError;
use conquest::{MapCatalog, MapDefinition};
use std::path::PathBuf;

fn print_map(map: &MapDefinition) {
    println!(
        "{} ({}): {} territories, {} continents",
        map.id(),
        map.name(),
        map.territories().len(),
        map.continents().len()
    );
    for continent in map.continents() {
        let count = map.continent_territories(&continent.id).count();
        println!(
            "  {:<16} bonus {:>2}, {count} territories",
            continent.name, continent.bonus
        );
    }
}

/// Execute the maps command.
///
/// # Errors
///
/// Returns an error if the map file cannot be read or fails validation.
pub(crate) fn execute(file: Option<PathBuf>) -> Result<(), CliError> {
    let Some(path) = file else {
        for map in MapCatalog::builtin().maps() {
            print_map(map);
            println!();
        }
        return Ok(());
    };

    println!("Validating: {}", path.display());
    println!();
    let map = MapDefinition::from_json_file(&path)?;
    print_map(&map);
    println!();
    println!("Validation successful!");

    Ok(())
}

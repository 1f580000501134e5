// src/commands/recipe.rs

//! Recipe inspection commands

use anyhow::Result;
use kiln::progress::status;
use kiln::recipe::SourceOrigin;
use kiln::Kitchen;

/// Print a recipe's identity, source and options
pub fn cmd_info(kitchen: &Kitchen, name: &str) -> Result<()> {
    let recipe = kitchen.load_recipe(name)?;

    println!("name:     {}", recipe.name);
    println!("version:  {}", recipe.version);
    if !recipe.desc.is_empty() {
        println!("desc:     {}", recipe.desc);
    }
    if !recipe.homepage.is_empty() {
        println!("homepage: {}", recipe.homepage);
    }
    if !recipe.license.is_empty() {
        println!("license:  {}", recipe.license);
    }
    match recipe.origin() {
        Some(SourceOrigin::Git(url)) => println!("git:      {}", url),
        Some(SourceOrigin::Archive(url)) => println!("source:   {}", url),
        None => println!("source:   (none)"),
    }
    if !recipe.patches.is_empty() {
        println!("patches:  {}", recipe.patches.join(", "));
    }
    println!(
        "strip: {}, fakeroot: {}, pack: {}",
        yes_no(recipe.strip),
        yes_no(recipe.fakeroot),
        recipe.pack.pack_option()
    );
    Ok(())
}

/// List recipe files whose name contains `term`
pub fn cmd_search(kitchen: &Kitchen, term: &str) -> Result<()> {
    let hits = kitchen.recipes().search(term);
    if hits.is_empty() {
        status::warn(&format!("No recipes matching '{}'", term));
        return Ok(());
    }

    let root = kitchen.layout().root();
    for path in hits {
        let shown = path.strip_prefix(root).unwrap_or(&path);
        println!("{}", shown.display());
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

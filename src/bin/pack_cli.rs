//! `brute-pack`: walk a GZDoom-layout asset directory and build a pack.
//!
//! Expected source layout: `flats/`, `patches/`, `sprites/`, `graphics/`
//! and `fonts/` holding PNGs, `maps/` holding UDMF PWADs. Missing
//! directories are skipped. Sprite draw offsets default to 0,0.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use brute_tools_lib::graphics::{
    convert_bob, convert_flat, convert_font, convert_patch, convert_sprite,
};
use brute_tools_lib::map::compile_level;
use brute_tools_lib::pack::{Archive, Branch, Lump};
use brute_tools_lib::wad::Wad;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage:");
        eprintln!("  brute-pack <asset_dir> <output.pack>");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  brute-pack ./assets ./brute.pack");
        std::process::exit(1);
    }
    let asset_dir = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);

    eprintln!("Packing '{}' ...", asset_dir.display());
    match build(&asset_dir, &output) {
        Ok(stats) => {
            eprintln!("Pack complete!");
            eprintln!("  Sprites:  {}", stats.sprites);
            eprintln!("  Flats:    {}", stats.flats);
            eprintln!("  Patches:  {}", stats.patches);
            eprintln!("  Graphics: {}", stats.bobs);
            eprintln!("  Fonts:    {}", stats.fonts);
            eprintln!("  Maps:     {}", stats.maps);
            eprintln!("  Output:   {}", output.display());
        }
        Err(e) => {
            eprintln!("Pack failed: {:?}", e);
            std::process::exit(1);
        }
    }
}

#[derive(Default)]
struct Stats {
    sprites: usize,
    flats: usize,
    patches: usize,
    bobs: usize,
    fonts: usize,
    maps: usize,
}

fn build(asset_dir: &Path, output: &Path) -> Result<Stats> {
    let mut stats = Stats::default();
    let mut root = Branch::new("")?;

    if let Some(branch) = convert_image_dir(asset_dir, "sprites", &mut stats.sprites, |img| {
        convert_sprite(img, 0, 0).map_err(Into::into)
    })? {
        root.push(branch);
    }
    if let Some(branch) = convert_image_dir(asset_dir, "flats", &mut stats.flats, |img| {
        convert_flat(img).map_err(Into::into)
    })? {
        root.push(branch);
    }
    if let Some(branch) = convert_image_dir(asset_dir, "patches", &mut stats.patches, |img| {
        convert_patch(img).map_err(Into::into)
    })? {
        root.push(branch);
    }
    if let Some(branch) = convert_image_dir(asset_dir, "graphics", &mut stats.bobs, |img| {
        convert_bob(img).map_err(Into::into)
    })? {
        root.push(branch);
    }
    if let Some(branch) = convert_fonts(asset_dir, &mut stats.fonts)? {
        root.push(branch);
    }
    if let Some(branch) = convert_maps(asset_dir, &mut stats.maps)? {
        root.push(branch);
    }

    let bytes = root.serialize();
    // Decode our own output before committing it to disk.
    Archive::parse(&bytes).context("serialized pack failed to re-parse")?;
    fs::write(output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(stats)
}

/// Convert every PNG in `asset_dir/<kind>` into a lump in a branch named
/// `<kind>`, using the file stem (lowercased) as the lump name.
fn convert_image_dir(
    asset_dir: &Path,
    kind: &str,
    counter: &mut usize,
    convert: impl Fn(&image::DynamicImage) -> Result<Vec<u8>>,
) -> Result<Option<Branch>> {
    let Some(files) = png_files(&asset_dir.join(kind))? else {
        return Ok(None);
    };
    let mut branch = Branch::new(kind)?;
    for path in files {
        let name = lump_name(&path)?;
        let img = image::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let content =
            convert(&img).with_context(|| format!("failed to convert {}", path.display()))?;
        branch.push(Lump::new(&name, content)?);
        *counter += 1;
    }
    Ok(Some(branch))
}

fn convert_fonts(asset_dir: &Path, counter: &mut usize) -> Result<Option<Branch>> {
    let Some(files) = png_files(&asset_dir.join("fonts"))? else {
        return Ok(None);
    };
    let mut branch = Branch::new("fonts")?;
    for path in files {
        let name = lump_name(&path)?;
        let img = image::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let font = convert_font(&img, &name)
            .with_context(|| format!("failed to convert {}", path.display()))?;
        branch.push(font);
        *counter += 1;
    }
    Ok(Some(branch))
}

fn convert_maps(asset_dir: &Path, counter: &mut usize) -> Result<Option<Branch>> {
    let dir = asset_dir.join("maps");
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("wad")))
        .collect();
    paths.sort();

    let mut branch = Branch::new("maps")?;
    for path in paths {
        let name = lump_name(&path)?;
        let data =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let wad = Wad::parse(&data)
            .with_context(|| format!("{} is not a usable PWAD", path.display()))?;
        let source = String::from_utf8_lossy(wad.textmap()?);
        let lumps =
            compile_level(&source).with_context(|| format!("map {} failed to compile", name))?;

        let mut map_branch = Branch::new(&name)?;
        map_branch.push(Lump::new("vertices", lumps.vertices)?);
        map_branch.push(Lump::new("sectors", lumps.sectors)?);
        map_branch.push(Lump::new("walls", lumps.walls)?);
        map_branch.push(Lump::new("patches", lumps.patches)?);
        map_branch.push(Lump::new("flats", lumps.flats)?);
        branch.push(map_branch);
        *counter += 1;
    }
    Ok(Some(branch))
}

/// Sorted PNG paths under `dir`, or `None` when the directory is absent.
fn png_files(dir: &Path) -> Result<Option<Vec<PathBuf>>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("png")))
        .collect();
    paths.sort();
    Ok(Some(paths))
}

fn lump_name(path: &Path) -> Result<String> {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => Ok(stem.to_lowercase()),
        None => bail!("{} has no usable file name", path.display()),
    }
}

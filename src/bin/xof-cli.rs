//! xof-cli - Command-line interface for the xof reader
//!
//! Inspects, decompresses and summarizes DirectX `.x` model files.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use xof::{decompress_bytes, load_with_options, FrameDecoder, LoadOptions, SceneModel, XofHeader};

#[derive(Parser)]
#[command(name = "xof-cli")]
#[command(about = "A CLI tool for inspecting DirectX .x model files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Text encoding of names and strings (an encoding label such as "utf-8")
    #[arg(short, long, global = true, default_value = "shift_jis")]
    encoding: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header fields, the frame table and load status
    Info {
        /// Model file to analyze
        input: PathBuf,
    },

    /// Write the uncompressed equivalent of a tzip/bzip file
    Decompress {
        /// Input compressed file
        input: PathBuf,

        /// Output uncompressed file
        output: PathBuf,

        /// Force overwrite of output file
        #[arg(short, long)]
        force: bool,
    },

    /// Print a summary of the loaded scene
    Dump {
        /// Model file to load
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = load_options(&cli.encoding).and_then(|options| match cli.command {
        Commands::Info { input } => show_file_info(&input, &options, cli.verbose),
        Commands::Decompress {
            input,
            output,
            force,
        } => decompress_file(&input, &output, force, cli.verbose, cli.quiet),
        Commands::Dump { input } => dump_scene(&input, &options, cli.verbose, cli.quiet),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_options(label: &str) -> Result<LoadOptions, Box<dyn std::error::Error>> {
    LoadOptions::default()
        .with_encoding_label(label)
        .ok_or_else(|| format!("Unknown text encoding '{}'", label).into())
}

fn progress_bar(size: usize, quiet: bool, message: &'static str) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    // Only worth showing for large files
    if quiet || size <= 1024 * 1024 {
        return Ok(None);
    }

    let pb = ProgressBar::new(2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    pb.inc(1);
    Ok(Some(pb))
}

fn decompress_file(
    input: &PathBuf,
    output: &PathBuf,
    force: bool,
    verbose: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Check if input file exists
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    // Check if output file exists and force flag
    if output.exists() && !force {
        return Err(format!(
            "Output file '{}' already exists. Use --force to overwrite",
            output.display()
        )
        .into());
    }

    if verbose {
        println!(
            "Decompressing '{}' to '{}'",
            input.display(),
            output.display()
        );
    }

    let start_time = Instant::now();

    let compressed_data = fs::read(input)?;
    let input_size = compressed_data.len();
    let header = XofHeader::parse(&compressed_data)?;

    if verbose {
        println!("Compressed size: {} bytes", input_size);
        println!("Encoding: {:?}", header.encoding);
    }
    if !header.encoding.is_compressed() && !quiet {
        println!("  Note: input is not compressed, copying unchanged");
    }

    let progress = progress_bar(input_size, quiet, "Decompressing...")?;

    let decompressed_data =
        decompress_bytes(&compressed_data).map_err(|e| format!("Decompression failed: {}", e))?;

    if let Some(ref pb) = progress {
        pb.inc(1);
        pb.finish_with_message("Decompression complete");
    }

    fs::write(output, &decompressed_data)?;

    let decompression_time = start_time.elapsed();
    let output_size = decompressed_data.len();
    let compression_ratio = (input_size as f64 / output_size as f64) * 100.0;

    if !quiet {
        println!("✓ Decompression successful!");
        println!("  Input:  {} bytes", input_size);
        println!("  Output: {} bytes", output_size);
        println!("  Ratio:  {:.1}%", compression_ratio);
        println!("  Time:   {:.2?}", decompression_time);
    }

    Ok(())
}

fn show_file_info(
    input: &PathBuf,
    options: &LoadOptions,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Check if input file exists
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    let data = fs::read(input)?;
    let header = XofHeader::parse(&data)?;

    println!("DirectX .x File Information:");
    println!("  File: {}", input.display());
    println!("  Size: {} bytes", data.len());
    println!("  Version: {}", String::from_utf8_lossy(&header.version));
    println!(
        "  Format: {:?} ({})",
        header.encoding,
        String::from_utf8_lossy(&header.encoding.tag())
    );
    println!("  Float Size: {} bits", header.float_width.bytes() * 8);

    if header.encoding.is_compressed() {
        let mut frames = FrameDecoder::new(&data)?;
        println!("  Declared Size: {} bytes", frames.declared_size());

        let mut frame_count = 0usize;
        let mut total = 0usize;
        while let Some(frame) = frames.next_frame()? {
            if verbose {
                println!(
                    "  Frame {}: {} -> {} bytes",
                    frame_count, frame.declared_compressed_size, frame.declared_uncompressed_size
                );
            }
            frame_count += 1;
            total += frame.declared_uncompressed_size as usize;
        }
        println!("  Frames: {} ({} bytes uncompressed)", frame_count, total);
    }

    match load_with_options(&data, options) {
        Ok(scene) => {
            println!(
                "  Scene: {} vertices, {} triangles, {} materials",
                scene.vertex_count(),
                scene.faces.len(),
                scene.materials.len()
            );
            println!("  Status: ✓ Valid .x file");
        }
        Err(e) => {
            println!("  Status: ✗ Invalid or corrupted .x file");
            if verbose {
                println!("  Error: {}", e);
            }
        }
    }

    Ok(())
}

fn dump_scene(
    input: &PathBuf,
    options: &LoadOptions,
    verbose: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Check if input file exists
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    let data = fs::read(input)?;
    let progress = progress_bar(data.len(), quiet, "Loading...")?;

    let scene = load_with_options(&data, options).map_err(|e| format!("Load failed: {}", e))?;

    if let Some(ref pb) = progress {
        pb.inc(1);
        pb.finish_with_message("Load complete");
    }

    if !quiet {
        print_scene(&scene, verbose);
    }

    Ok(())
}

fn print_scene(scene: &SceneModel, verbose: bool) {
    if let Some(header) = scene.header {
        println!(
            "Header: {}.{} flags {}",
            header.major, header.minor, header.flags
        );
    }
    println!("Vertices:  {}", scene.vertex_count());
    println!("Triangles: {}", scene.faces.len());

    println!("Materials: {}", scene.materials.len());
    for (i, material) in scene.materials.iter().enumerate() {
        let [r, g, b, a] = material.diffuse;
        println!(
            "  [{}] {} diffuse ({:.3}, {:.3}, {:.3}, {:.3}) power {:.2} triangles {}",
            i,
            material.name.as_deref().unwrap_or("<unnamed>"),
            r,
            g,
            b,
            a,
            material.specular_power,
            scene.faces_for_material(i).count()
        );
        if let Some(texture) = material.texture_index {
            println!("      texture: {}", scene.textures[texture]);
        }
        if let Some(sphere) = material.sphere_texture_index {
            println!(
                "      sphere:  {} ({:?})",
                scene.textures[sphere], material.sphere_mode
            );
        }
    }

    println!("Textures:  {}", scene.textures.len());
    for texture in &scene.textures {
        println!("  {}", texture);
    }

    if verbose {
        println!("Vertex list:");
        for (i, ((position, normal), uv)) in scene
            .positions
            .iter()
            .zip(&scene.normals)
            .zip(&scene.uvs)
            .enumerate()
        {
            println!(
                "  {}: pos {:?} normal {:?} uv {:?}",
                i, position, normal, uv
            );
        }
        println!("Triangle list:");
        for (i, (face, material)) in scene.faces.iter().zip(&scene.face_materials).enumerate() {
            println!("  {}: {:?} material {}", i, face, material);
        }
    }
}

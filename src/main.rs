use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process;
use tattoo_preview::{
    CropSelection, Dimensions, PreviewOptions, PromptContext, Rect, ScarStore, assemble_request,
    mask_to_alpha, prepare_preview, synthesize_mask,
};

#[derive(Parser)]
#[command(
    name = "tattoo-preview",
    version,
    about = "Scar-aware tattoo preview tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prepare the canvas-sized image and edit mask for a generation call
    Prepare {
        /// Uploaded source image
        #[arg(long)]
        image: PathBuf,
        /// Directory of scar annotation XML files
        #[arg(long)]
        labels: Option<PathBuf>,
        /// Crop selection as JSON: {"x":100,"y":100,"width":200,"height":200}
        #[arg(long)]
        crop: String,
        /// Tattoo style handed to the prompt step
        #[arg(long, default_value = "traditional")]
        style: String,
        /// Skin tone descriptor handed to the prompt step
        #[arg(long = "skin-tone", default_value = "medium")]
        skin_tone: String,
        /// Prompt text; when present the full request payload is validated
        #[arg(long)]
        prompt: Option<String>,
        /// Generation canvas as WIDTHxHEIGHT
        #[arg(long, default_value = "1024x1024")]
        canvas: String,
        /// Output directory
        #[arg(long, default_value = "preview-out")]
        out_dir: PathBuf,
    },
    /// Synthesize a standalone edit mask
    Mask {
        /// Mask width in pixels
        #[arg(long)]
        width: u32,
        /// Mask height in pixels
        #[arg(long)]
        height: u32,
        /// Scar box in crop space as xmin,ymin,xmax,ymax
        #[arg(long)]
        scar: Option<String>,
        /// Output PNG path
        #[arg(long, default_value = "mask.png")]
        out: PathBuf,
    },
    /// Look up the scar recorded for an image (label errors surface here)
    Lookup {
        /// Directory of scar annotation XML files
        #[arg(long)]
        labels: PathBuf,
        /// Image filename the annotation is keyed by
        #[arg(long)]
        image: String,
    },
}

fn main() {
    env_logger::init();

    match Cli::parse().command {
        Command::Prepare {
            image,
            labels,
            crop,
            style,
            skin_tone,
            prompt,
            canvas,
            out_dir,
        } => run_prepare(
            image, labels, &crop, style, skin_tone, prompt, &canvas, &out_dir,
        ),
        Command::Mask {
            width,
            height,
            scar,
            out,
        } => run_mask(width, height, scar.as_deref(), &out),
        Command::Lookup { labels, image } => run_lookup(labels, &image),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_prepare(
    image_path: PathBuf,
    labels: Option<PathBuf>,
    crop: &str,
    style: String,
    skin_tone: String,
    prompt: Option<String>,
    canvas: &str,
    out_dir: &PathBuf,
) {
    let crop_rect: Rect = match serde_json::from_str(crop) {
        Ok(rect) => rect,
        Err(e) => {
            eprintln!("Error parsing crop JSON: {}", e);
            process::exit(2);
        }
    };

    let canvas = match parse_canvas(canvas) {
        Some(c) => c,
        None => {
            eprintln!("Error: canvas must be WIDTHxHEIGHT, got '{}'", canvas);
            process::exit(2);
        }
    };

    let source = match image::open(&image_path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            eprintln!("Error reading image '{}': {}", image_path.display(), e);
            process::exit(2);
        }
    };

    let selection = CropSelection {
        rect: crop_rect,
        source: Dimensions::new(source.width(), source.height()),
    };

    let image_id = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let scar = labels
        .map(ScarStore::new)
        .and_then(|store| store.lookup_or_none(&image_id));

    let prepared = match prepare_preview(
        &source,
        &selection,
        scar.map(|record| record.bounding_box),
        &PreviewOptions { canvas },
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error preparing preview: {}", e);
            process::exit(3);
        }
    };

    match prepared.scar_in_crop {
        Some(r) => println!(
            "Scar in cropped region at ({}, {}), {}x{} px",
            r.x, r.y, r.width, r.height
        ),
        None => println!("No scar in the cropped region; the whole area is editable"),
    }

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Error creating '{}': {}", out_dir.display(), e);
        process::exit(4);
    }

    let image_out = out_dir.join("preview-image.png");
    let mask_out = out_dir.join("preview-mask.png");
    let context_out = out_dir.join("prompt-context.json");

    if let Err(e) = prepared.image.save(&image_out) {
        eprintln!("Error writing '{}': {}", image_out.display(), e);
        process::exit(4);
    }
    if let Err(e) = mask_to_alpha(&prepared.mask).save(&mask_out) {
        eprintln!("Error writing '{}': {}", mask_out.display(), e);
        process::exit(4);
    }

    let context = PromptContext {
        style,
        skin_tone,
        crop: crop_rect,
        scar_in_crop: prepared.scar_in_crop,
    };
    let context_json = match context.to_json() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing prompt context: {}", e);
            process::exit(4);
        }
    };
    if let Err(e) = fs::write(&context_out, context_json) {
        eprintln!("Error writing '{}': {}", context_out.display(), e);
        process::exit(4);
    }

    if let Some(prompt) = prompt {
        let request = match assemble_request(&prompt, &prepared.image, &prepared.mask, canvas) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Error assembling generation request: {}", e);
                process::exit(5);
            }
        };
        let meta = serde_json::json!({
            "prompt": request.prompt,
            "canvas": request.canvas,
            "image": image_out,
            "mask": mask_out,
        });
        let request_out = out_dir.join("request.json");
        let meta_json = match serde_json::to_string_pretty(&meta) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Error serializing request metadata: {}", e);
                process::exit(4);
            }
        };
        if let Err(e) = fs::write(&request_out, meta_json) {
            eprintln!("Error writing '{}': {}", request_out.display(), e);
            process::exit(4);
        }
        println!("Validated generation request ({} byte mask)", request.mask_png.len());
    }

    println!(
        "Wrote {}, {} and {}",
        image_out.display(),
        mask_out.display(),
        context_out.display()
    );
}

fn run_mask(width: u32, height: u32, scar: Option<&str>, out: &PathBuf) {
    if width == 0 || height == 0 {
        eprintln!("Error: mask dimensions must be non-zero, got {}x{}", width, height);
        process::exit(2);
    }

    let scar_rect = match scar {
        Some(text) => match parse_box(text) {
            Some(rect) => Some(rect),
            None => {
                eprintln!("Error: scar must be xmin,ymin,xmax,ymax, got '{}'", text);
                process::exit(2);
            }
        },
        None => None,
    };

    let mask = synthesize_mask(Dimensions::new(width, height), scar_rect);
    if let Err(e) = mask_to_alpha(&mask).save(out) {
        eprintln!("Error writing '{}': {}", out.display(), e);
        process::exit(4);
    }
    println!("Wrote {}", out.display());
}

fn run_lookup(labels: PathBuf, image: &str) {
    let store = ScarStore::new(labels);
    match store.lookup(image) {
        Ok(Some(record)) => {
            let bb = record.bounding_box;
            println!(
                "Scar for '{}': ({}, {}), {}x{} px",
                image, bb.x, bb.y, bb.width, bb.height
            );
        }
        Ok(None) => println!("No scar recorded for '{}'", image),
        Err(e) => {
            eprintln!("Error reading scar annotation for '{}': {}", image, e);
            process::exit(3);
        }
    }
}

/// Parse a "WIDTHxHEIGHT" canvas argument.
fn parse_canvas(text: &str) -> Option<Dimensions> {
    let (w, h) = text.split_once(['x', 'X'])?;
    Some(Dimensions::new(
        w.trim().parse().ok()?,
        h.trim().parse().ok()?,
    ))
}

/// Parse an "xmin,ymin,xmax,ymax" box argument.
fn parse_box(text: &str) -> Option<Rect> {
    let parts: Option<Vec<i32>> = text.split(',').map(|p| p.trim().parse().ok()).collect();
    let parts = parts?;
    if parts.len() != 4 {
        return None;
    }
    Some(Rect::from_corners(parts[0], parts[1], parts[2], parts[3]))
}

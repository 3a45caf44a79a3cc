//! meshwarp CLI - mesh deformation command-line tool.
//!
//! Usage: meshwarp <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `meshwarp --help` for available commands. Set `RUST_LOG=debug` to log
//! every pass.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::info;
use nalgebra::Point3;

use meshwarp::algo::ripple::{self, CoincidentAttractor, DisplacementResult, RippleOptions};
use meshwarp::algo::subdivide::{self, SubdivideOptions};
use meshwarp::algo::Progress;
use meshwarp::io;
use meshwarp::mesh::HalfEdgeMesh;

#[derive(Parser)]
#[command(name = "meshwarp")]
#[command(author, version, about = "Mesh deformation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Subdivide every face around its displaced centroid
    Subdivide {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Distance new vertices are pushed along the surface normal
        #[arg(short, long, default_value = "1.0", allow_negative_numbers = true)]
        displacement: f64,

        /// Number of subdivision passes
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Ripple vertices along their normals around attractor points
    Ripple {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Attractor point as X,Y,Z (repeatable)
        #[arg(short, long = "attractor", value_parser = parse_point, allow_negative_numbers = true)]
        attractors: Vec<Point3<f64>>,

        /// File with one attractor point per line
        #[arg(long = "attractors")]
        attractor_file: Option<PathBuf>,

        /// Wave amplitude
        #[arg(short, long, default_value = "1.0", allow_negative_numbers = true)]
        distance: f64,

        /// Number of ripple iterations
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Treat an attractor on a vertex as a full-amplitude contribution instead of NaN
        #[arg(long)]
        limit_coincident: bool,

        /// Write per-vertex displacements of the last iteration to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Subdivide {
            input,
            output,
            displacement,
            iterations,
            sequential,
        } => {
            let options = SubdivideOptions::new(displacement, iterations).with_parallel(!sequential);
            cmd_subdivide(&input, &output, &options)?;
        }

        Commands::Ripple {
            input,
            output,
            mut attractors,
            attractor_file,
            distance,
            iterations,
            limit_coincident,
            report,
            sequential,
        } => {
            if let Some(path) = attractor_file {
                attractors.extend(read_attractors(&path)?);
            }
            let coincident = if limit_coincident {
                CoincidentAttractor::Limit
            } else {
                CoincidentAttractor::Propagate
            };
            let options = RippleOptions::new(distance, iterations)
                .with_coincident(coincident)
                .with_parallel(!sequential);
            cmd_ripple(&input, &output, &attractors, &options, report.as_deref())?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let percent = (current.min(total) * 100) / total;

        // Only ever move forward
        let previous = max_percent.fetch_max(percent, Ordering::Relaxed);
        if percent <= previous && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {} ({}/{})", bar, space, percent, message, current, total);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());

    let mut min_area = f64::MAX;
    let mut max_area = 0.0_f64;
    for fid in mesh.face_ids() {
        let area = mesh.face_area(fid);
        min_area = min_area.min(area);
        max_area = max_area.max(area);
    }

    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Face area range: [{:.6}, {:.6}]", min_area, max_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    if mesh.is_triangle_mesh() {
        println!("Mesh type: Triangle mesh");
    } else if mesh.is_quad_mesh() {
        println!("Mesh type: Quad mesh");
    } else {
        println!("Mesh type: Mixed triangle/quad mesh");
    }

    let boundary_verts = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_boundary_vertex(v))
        .count();
    if boundary_verts == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary_verts);
    }

    Ok(())
}

fn cmd_subdivide(
    input: &Path,
    output: &Path,
    options: &SubdivideOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!(
        "Applying centroid subdivision ({} iterations, displacement={}, {})...",
        options.iterations, options.displacement, mode
    );
    let progress = create_progress();

    let start = Instant::now();
    let result = subdivide::centroid_subdivide_with_progress(&mesh, options, &progress)?;
    let elapsed = start.elapsed();
    info!("centroid subdivision finished in {:.2?}", elapsed);

    println!("Result: {} vertices, {} faces", result.num_vertices(), result.num_faces());
    io::save(&result, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_ripple(
    input: &Path,
    output: &Path,
    attractors: &[Point3<f64>],
    options: &RippleOptions,
    report: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!(
        "Applying attractor ripple ({} attractors, {} iterations, distance={}, {})...",
        attractors.len(),
        options.iterations,
        options.distance,
        mode
    );
    let progress = create_progress();

    let start = Instant::now();
    let (result, displacement) =
        ripple::attractor_ripple_with_progress(&mesh, attractors, options, &progress)?;
    let elapsed = start.elapsed();
    info!("attractor ripple finished in {:.2?}", elapsed);

    let nan_count = displacement.displacements.iter().filter(|d| d.is_nan()).count();
    if nan_count > 0 {
        eprintln!(
            "Warning: {} vertices coincide with an attractor and moved to NaN (see --limit-coincident)",
            nan_count
        );
    }

    io::save(&result, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    if let Some(path) = report {
        write_report(&displacement, path)?;
        println!("Report: {}", path.display());
    }

    Ok(())
}

/// Parse a point given as `X,Y,Z` or `X Y Z`.
fn parse_point(s: &str) -> Result<Point3<f64>, String> {
    let coords = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<f64>().map_err(|e| format!("invalid coordinate '{}': {}", t, e)))
        .collect::<Result<Vec<f64>, String>>()?;

    match coords[..] {
        [x, y, z] => Ok(Point3::new(x, y, z)),
        _ => Err(format!("expected three coordinates, got {}", coords.len())),
    }
}

/// Read attractor points, one per line. Blank lines and `#` comments are skipped.
fn read_attractors(path: &Path) -> Result<Vec<Point3<f64>>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let mut points = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let p = parse_point(line)
            .map_err(|e| format!("{}:{}: {}", path.display(), line_no + 1, e))?;
        points.push(p);
    }
    Ok(points)
}

/// Write `index x y z displacement` lines for every vertex.
fn write_report(result: &DisplacementResult, path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "# index x y z displacement")?;
    for (i, (p, d)) in result.positions.iter().zip(&result.displacements).enumerate() {
        writeln!(writer, "{} {} {} {} {}", i, p.x, p.y, p.z, d)?;
    }
    writer.flush()
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate mandelgrid;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use std::str::FromStr;

use mandelgrid::{compute, Fractal, Mandelbrot, ShmContext};

/// Given a string and a separator, returns the two values separated
/// by the separator.
fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const ITERATIONS: &str = "iterations";
const TASKS: &str = "tasks";
const XRANGE: &str = "x-range";
const YRANGE: &str = "y-range";

fn args<'a>() -> ArgMatches<'a> {
    let max_tasks = num_cpus::get();

    App::new("mandelgrid")
        .version("0.1.0")
        .about("Row-partitioned Mandelbrot set calculator")
        .arg(
            Arg::with_name(WIDTH)
                .required(false)
                .long(WIDTH)
                .short("w")
                .takes_value(true)
                .default_value("800")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        65_536,
                        "Could not parse image width",
                        "Image width must be between 1 and 65536",
                    )
                })
                .help("Width of the computed matrix in pixels"),
        )
        .arg(
            Arg::with_name(HEIGHT)
                .required(false)
                .long(HEIGHT)
                .short("H")
                .takes_value(true)
                .default_value("600")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        65_536,
                        "Could not parse image height",
                        "Image height must be between 1 and 65536",
                    )
                })
                .help("Height of the computed matrix in pixels"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("256")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Per-pixel iteration budget"),
        )
        .arg(
            Arg::with_name(TASKS)
                .required(false)
                .long(TASKS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_tasks,
                        "Could not parse task count",
                        &format!("Task count must be between 1 and {}", max_tasks),
                    )
                })
                .help("Number of worker tasks to partition the rows across"),
        )
        .arg(
            Arg::with_name(XRANGE)
                .required(false)
                .long(XRANGE)
                .short("x")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.25,0.75")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse x range"))
                .help("Bounds on the real axis, min,max"),
        )
        .arg(
            Arg::with_name(YRANGE)
                .required(false)
                .long(YRANGE)
                .short("y")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-1.25,1.25")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse y range"))
                .help("Bounds on the imaginary axis, min,max"),
        )
        .get_matches()
}

fn main() {
    env_logger::init();
    let matches = args();

    let width = usize::from_str(matches.value_of(WIDTH).unwrap()).expect("Bad image width");
    let height = usize::from_str(matches.value_of(HEIGHT).unwrap()).expect("Bad image height");
    let iterations =
        usize::from_str(matches.value_of(ITERATIONS).unwrap()).expect("Bad iteration count");
    let tasks = usize::from_str(matches.value_of(TASKS).unwrap()).expect("Bad task count");
    let x_range =
        parse_pair(matches.value_of(XRANGE).unwrap(), ',').expect("Error parsing x range");
    let y_range =
        parse_pair(matches.value_of(YRANGE).unwrap(), ',').expect("Error parsing y range");

    let mut fractal = match Mandelbrot::new(width, height, iterations) {
        Ok(fractal) => fractal,
        Err(e) => {
            eprintln!("Bad configuration: {}", e);
            std::process::exit(1);
        }
    };
    fractal.set_x_range(x_range);
    fractal.set_y_range(y_range);

    let shm = ShmContext::new();
    match compute(&fractal, &shm, tasks) {
        Err(e) => {
            eprintln!("Computation failure: {}", e);
            std::process::exit(1);
        }
        Ok(matrix) => {
            let escaped = matrix
                .iter()
                .flat_map(|row| row.iter())
                .filter(|v| **v > 0.0)
                .count();
            let max = matrix
                .iter()
                .flat_map(|row| row.iter())
                .cloned()
                .fold(0.0_f64, f64::max);
            println!(
                "computed {}x{} matrix with {} task(s): {} escaped pixels, max smoothed value {:.4}",
                width, height, tasks, escaped, max
            );
        }
    }
}

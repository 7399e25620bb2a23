//! Implementation of the memoize CLI commands.

use std::cell::Cell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use serde_json::Value;

use crate::cache::CacheStore;
use crate::digest::ArgList;
use crate::memo::Memoizer;
use crate::types::config::{Config, CONFIG_FILE};
use crate::{MemoError, MemoResult};

/// Prints the cache key of a JSON argument list.
pub fn key(args: &[String], named: &[String], canonical: bool, config: &Config) -> MemoResult<()> {
    let list = parse_arg_list(args, named)?;
    let digester = Memoizer::from_config(config).digester();

    println!("{}", digester.key(&list)?);
    if canonical {
        println!("{}", hex::encode(digester.canonical_bytes(&list)?));
    }
    Ok(())
}

/// Builds an [`ArgList`] from command line JSON values.
pub fn parse_arg_list(args: &[String], named: &[String]) -> MemoResult<ArgList> {
    let mut list = ArgList::new();
    for raw in args {
        let value: Value = serde_json::from_str(raw)?;
        list.push_arg(value)?;
    }
    for pair in named {
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| MemoError::argument(format!("expected NAME=JSON, got '{pair}'")))?;
        if name.is_empty() {
            return Err(MemoError::argument(format!("empty argument name in '{pair}'")));
        }
        let value: Value = serde_json::from_str(raw)?;
        list.insert_named(name, value)?;
    }
    Ok(list)
}

/// Runs the memoization scenarios.
pub async fn demo(size: Option<usize>, config: &Config) -> MemoResult<()> {
    let memoizer = Memoizer::from_config(config);

    println!("1. Repeated call");
    let calls = Cell::new(0u32);
    let mut square = memoizer.wrap(|x: i64| -> MemoResult<i64> {
        calls.set(calls.get() + 1);
        Ok(x * x)
    });
    let first = square.call(3)?;
    let second = square.call(3)?;
    println!("   square(3) = {first}, then {second}; function ran {} time(s)", calls.get());
    println!("   entries: {}\n", square.cache().len());

    println!("2. Failing call");
    let calls = Cell::new(0u32);
    let mut reciprocal = memoizer.wrap(|x: i64| -> MemoResult<f64> {
        calls.set(calls.get() + 1);
        if x == 0 {
            return Err(MemoError::argument("reciprocal of zero"));
        }
        Ok(1.0 / x as f64)
    });
    for _ in 0..2 {
        match reciprocal.call(0) {
            Ok(value) => println!("   reciprocal(0) = {value}"),
            Err(e) => println!("   reciprocal(0) failed: {e}"),
        }
    }
    println!(
        "   function ran {} time(s); entries: {}\n",
        calls.get(),
        reciprocal.cache().len()
    );

    println!("3. Integer 3 versus float 3.0");
    let mut twice = memoizer.wrap(|args: ArgList| -> MemoResult<f64> {
        let x: f64 = args.get(0)?;
        Ok(x * 2.0)
    });
    twice.call(ArgList::new().with_arg(3)?)?;
    twice.call(ArgList::new().with_arg(3.0)?)?;
    println!("   entries: {} (integers and floats are distinct keys)\n", twice.cache().len());

    let size = size.unwrap_or(config.demo.matrix_size);
    println!("4. {size}x{size} matrix");
    let mut norm = memoizer.wrap_pure(|m: Vec<Vec<f64>>| product_norm(&m));
    let matrix = sample_matrix(size);
    let started = Instant::now();
    let cold = norm.call(matrix.clone())?;
    let cold_time = started.elapsed();
    let started = Instant::now();
    let warm = norm.call(matrix)?;
    let warm_time = started.elapsed();
    println!("   first call:  {cold:.4} in {cold_time:?}");
    println!("   second call: {warm:.4} in {warm_time:?}\n");

    println!("5. Concurrent callers");
    let calls = AtomicUsize::new(0);
    let slow = memoizer.wrap_async(|x: u64| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok::<_, MemoError>(x + 1)
        }
    });
    let (a, b, c, d) = tokio::join!(slow.call(1), slow.call(1), slow.call(1), slow.call(1));
    println!(
        "   results: {:?}; function ran {} time(s)",
        [a?, b?, c?, d?],
        calls.load(Ordering::SeqCst)
    );

    Ok(())
}

/// Deterministic test matrix.
pub fn sample_matrix(size: usize) -> Vec<Vec<f64>> {
    (0..size)
        .map(|i| {
            (0..size)
                .map(|j| ((i * 31 + j * 17) % 97) as f64 / 97.0)
                .collect()
        })
        .collect()
}

/// Frobenius norm of `m * m`.
pub fn product_norm(m: &[Vec<f64>]) -> f64 {
    let n = m.len();
    let mut sum = 0.0;
    for row in m {
        for j in 0..n {
            let cell: f64 = row.iter().zip(m).map(|(a, other)| a * other[j]).sum();
            sum += cell * cell;
        }
    }
    sum.sqrt()
}

/// Writes a default configuration file.
pub fn init(path: Option<PathBuf>) -> MemoResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    Config::default_config().save(&config_path)?;
    println!("Configuration created at: {}", config_path.display());
    Ok(())
}

/// Prints the effective configuration.
pub fn config_cmd(config: &Config) -> MemoResult<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

pub fn version() {
    println!("memoize {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::cache_key;

    #[test]
    fn test_parse_arg_list() {
        let list = parse_arg_list(
            &["3".to_string(), "\"x\"".to_string()],
            &["scale=1.5".to_string()],
        )
        .unwrap();

        assert_eq!(list.positional().len(), 2);
        assert_eq!(list.get_named::<f64>("scale").unwrap(), 1.5);
    }

    #[test]
    fn test_parsed_key_matches_library_key() {
        let parsed = parse_arg_list(&["[1,2]".to_string()], &[]).unwrap();
        let built = ArgList::new().with_arg(vec![1, 2]).unwrap();

        assert_eq!(cache_key(&parsed).unwrap(), cache_key(&built).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            parse_arg_list(&["not json".to_string()], &[]),
            Err(MemoError::Json(_))
        ));
        assert!(matches!(
            parse_arg_list(&[], &["novalue".to_string()]),
            Err(MemoError::Argument(_))
        ));
        assert!(matches!(
            parse_arg_list(&[], &["a=1".to_string(), "a=2".to_string()]),
            Err(MemoError::Digest(_))
        ));
    }

    #[test]
    fn test_product_norm_identity() {
        let identity = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!((product_norm(&identity) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_sample_matrix_shape() {
        let m = sample_matrix(5);
        assert_eq!(m.len(), 5);
        assert!(m.iter().all(|row| row.len() == 5));
        assert_eq!(m, sample_matrix(5));
    }
}

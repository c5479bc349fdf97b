//! `cauchy` binary - erasure code files into fragment files and back

use std::fs;

use anyhow::{Context, Result};
use bytes::Bytes;
use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashMap as HashMap;

use cauchyrs::args::{fragment_path, parse_args, split_fragment_path};
use cauchyrs::{CauchyCoder, Fragment, RunConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = parse_args();
    match matches.subcommand() {
        Some(("encode", sub_matches)) => handle_encode(sub_matches),
        Some(("decode", sub_matches)) => handle_decode(sub_matches),
        Some(("repair", sub_matches)) => handle_repair(sub_matches),
        Some((cmd, _)) => anyhow::bail!("Unknown command: {}", cmd),
        None => anyhow::bail!("No command specified"),
    }
}

fn coder_from_args(matches: &clap::ArgMatches) -> Result<CauchyCoder> {
    let get = |name: &str| matches.get_one::<usize>(name).copied().unwrap_or(0);
    CauchyCoder::new(get("k"), get("m"), get("w")).context("Invalid coding parameters")
}

fn handle_encode(matches: &clap::ArgMatches) -> Result<()> {
    let coder = coder_from_args(matches)?;
    let config = RunConfig::from_args(matches);
    let files: Vec<&String> = matches
        .get_many::<String>("files")
        .context("No files to encode")?
        .collect();

    let pool = config
        .thread_pool()
        .context("Failed to build the worker thread pool")?;
    debug!(
        "Encoding {} files on {} threads",
        files.len(),
        pool.current_num_threads()
    );

    let encode_one = |file: &&String| -> Result<(usize, usize)> {
        let contents = fs::read(file).with_context(|| format!("Failed to read {file}"))?;
        let object = Bytes::from(contents);
        let fragments = coder
            .encode(&object)
            .with_context(|| format!("Failed to encode {file}"))?;
        for fragment in &fragments {
            let path = fragment_path(file, fragment.index);
            fs::write(&path, &fragment.data).with_context(|| format!("Failed to write {path}"))?;
        }
        Ok((object.len(), fragments.first().map_or(0, Fragment::len)))
    };

    let summaries: Vec<(usize, usize)> = if config.parallel {
        pool.install(|| files.par_iter().map(encode_one).collect::<Result<_>>())?
    } else {
        files.iter().map(encode_one).collect::<Result<_>>()?
    };

    for (file, (size, fragment_size)) in files.iter().zip(summaries) {
        println!(
            "{file}: {} fragments of {fragment_size} bytes, original size {size}",
            coder.params().total()
        );
    }
    Ok(())
}

/// Read fragment files, taking each index from its `.frag.<index>` suffix
fn load_fragments(paths: &[&String]) -> Result<Vec<Fragment>> {
    let mut sources: HashMap<usize, String> = HashMap::default();
    let mut fragments = Vec::with_capacity(paths.len());
    for path in paths {
        let (_, index) = split_fragment_path(path)
            .with_context(|| format!("Cannot tell the fragment index of {path}"))?;
        if let Some(previous) = sources.insert(index, path.to_string()) {
            anyhow::bail!("Fragment {index} given twice: {previous} and {path}");
        }
        let data = fs::read(path).with_context(|| format!("Failed to read {path}"))?;
        fragments.push(Fragment::new(index, data));
    }
    debug!("Loaded fragments {:?}", {
        let mut indices: Vec<_> = sources.keys().copied().collect();
        indices.sort_unstable();
        indices
    });
    Ok(fragments)
}

/// The object path shared by every fragment argument
fn common_base(paths: &[&String]) -> Result<String> {
    let mut bases = paths
        .iter()
        .filter_map(|path| split_fragment_path(path).map(|(base, _)| base));
    let first = bases
        .next()
        .context("Cannot derive a base path from the fragments")?;
    if let Some(other) = bases.find(|base| *base != first) {
        anyhow::bail!("Fragments come from different objects: {first} and {other}; pass --base");
    }
    Ok(first.to_string())
}

fn fragment_args(matches: &clap::ArgMatches) -> Result<Vec<&String>> {
    Ok(matches
        .get_many::<String>("fragments")
        .context("No fragments given")?
        .collect())
}

fn handle_decode(matches: &clap::ArgMatches) -> Result<()> {
    let coder = coder_from_args(matches)?;
    let size = *matches.get_one::<usize>("size").context("--size is required")?;
    let output = matches
        .get_one::<String>("output")
        .context("--output is required")?;

    let fragments = load_fragments(&fragment_args(matches)?)?;
    let object = coder
        .decode(&fragments, size)
        .context("Failed to decode fragments")?;
    fs::write(output, &object).with_context(|| format!("Failed to write {output}"))?;
    info!("Decoded {} bytes into {}", object.len(), output);
    Ok(())
}

fn handle_repair(matches: &clap::ArgMatches) -> Result<()> {
    let coder = coder_from_args(matches)?;
    let indices: Vec<usize> = matches
        .get_many::<usize>("index")
        .context("No fragment indices to repair")?
        .copied()
        .collect();

    let paths = fragment_args(matches)?;
    let fragments = load_fragments(&paths)?;
    let base = match matches.get_one::<String>("base") {
        Some(base) => base.clone(),
        None => common_base(&paths)?,
    };

    let repaired = coder
        .repair(&fragments, &indices)
        .context("Failed to repair fragments")?;
    for fragment in &repaired {
        let path = fragment_path(&base, fragment.index);
        fs::write(&path, &fragment.data).with_context(|| format!("Failed to write {path}"))?;
        println!("Repaired {path}");
    }
    Ok(())
}

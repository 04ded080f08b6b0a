use litecompat::container::ConfigGuiCandidates;
use litecompat::jvm::BinaryName;
use litecompat::mappings::{IdentityResolver, MappingSet};
use litecompat::provider::{ClassProvider, Error};
use litecompat::remap::{IdentityRemapper, Remapper};
use litecompat::settings::Settings;
use litecompat::source;

use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("{}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let matches = Command::new("LiteLoader mod remapper")
        .version(clap::crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Remap the classes of a LiteLoader mod into the runtime namespace")
        .arg(
            Arg::new("mod")
                .long("mod")
                .value_name("PATH")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Mod to remap (an unpacked directory or an archive)"),
        )
        .arg(
            Arg::new("mappings")
                .long("mappings")
                .value_name("TINY")
                .value_parser(value_parser!(PathBuf))
                .help("Tiny v2 mappings file (classes are left as-is without one)"),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .value_name("NAMESPACE")
                .default_value("intermediary")
                .help("Namespace the mod was compiled against (eg. `intermediary`)"),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .value_name("NAMESPACE")
                .default_value("named")
                .help("Namespace of the runtime (eg. `named`)"),
        )
        .arg(
            Arg::new("dev")
                .long("dev")
                .action(ArgAction::SetTrue)
                .help("Apply development environment patches"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Where to write remapped classes (defaults to the working directory)"),
        )
        .arg(
            Arg::new("CLASS")
                .num_args(0..)
                .help("Classes to remap (defaults to every class in the mod)"),
        )
        .get_matches();

    let mut settings = Settings::default();
    settings.development_mode = matches.get_flag("dev");
    settings.dump_directory = None;

    let mod_path = matches
        .get_one::<PathBuf>("mod")
        .expect("`--mod` is required");
    log::info!("Opening mod '{}'", mod_path.display());
    let source: Arc<dyn source::ModSource> = Arc::from(source::open_mod(mod_path)?);

    let remapper: Arc<dyn Remapper> = match matches.get_one::<PathBuf>("mappings") {
        Some(mappings_path) => {
            log::info!("Reading mappings '{}'", mappings_path.display());
            let mappings = MappingSet::read_from_path(mappings_path)?;
            let from = matches.get_one::<String>("from").map_or("intermediary", String::as_str);
            let to = matches.get_one::<String>("to").map_or("named", String::as_str);
            settings.resolve_config_gui_super_classes(&mappings.resolver(to)?);
            Arc::new(mappings.remapper(from, to)?)
        }
        None => {
            settings.resolve_config_gui_super_classes(&IdentityResolver);
            Arc::new(IdentityRemapper)
        }
    };

    let class_names: Vec<BinaryName> = match matches.get_many::<String>("CLASS") {
        Some(names) => names.map(BinaryName::normalize).collect(),
        None => source
            .entries()?
            .iter()
            .filter_map(|path| BinaryName::from_class_file_path(path))
            .collect(),
    };

    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let candidates = Arc::new(ConfigGuiCandidates::new());
    let provider = ClassProvider::new(source, remapper, candidates.clone(), settings);

    for class_name in &class_names {
        match provider.class_bytes(class_name.as_str())? {
            Some(bytes) => {
                let class_file = output.join(class_name.class_file_path());
                log::info!("Writing '{}'", class_file.display());
                if let Some(parent) = class_file.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&class_file, &bytes)?;
            }
            None => log::error!("No class '{}' in mod", class_name),
        }
    }

    for candidate in candidates.names() {
        println!("{}", BinaryName::normalize(candidate).to_dotted());
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use schemaforge_codegen::{render_contract, ApiSpecification};
use schemaforge_core::engine::Engine;
use schemaforge_core::providers::{
    ApiDocumentationProvider, CoercionProvider, TransformProvider, ValidationProvider,
};
use schemaforge_core::variants::{ExpectationHooks, FactoryHooks, ModelClassHooks};
use schemaforge_core::{
    default_providers, DecoratorProvider, EventTopic, ExpectationOptions, FactoryOptions,
    RenderOptions, RenderOutput, SchemaRegistry, TypeGraph,
};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "schemaforge")]
#[command(about = "Generate decorated TypeScript models, test helpers and controller contracts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit decorated model classes and enums
    Models {
        /// Type graph JSON file
        graph: PathBuf,

        #[command(flatten)]
        pass: PassArgs,

        /// Write this pass's schema registry as JSON
        #[arg(long, value_name = "FILE")]
        registry_out: Option<PathBuf>,

        /// Decorator provider, in application order (repeatable; defaults to
        /// validation, transform and api-docs)
        #[arg(long = "provider", value_enum)]
        providers: Vec<ProviderArg>,

        /// Module the coercion provider imports its helpers from
        #[arg(long, default_value = "@schemaforge/coercion")]
        coercion_module: String,

        /// Do not mark properties `readonly`
        #[arg(long)]
        no_readonly: bool,

        /// Do not add `!` to required properties
        #[arg(long)]
        no_assertions: bool,

        /// Do not emit the `Object.assign` constructor
        #[arg(long)]
        no_constructor: bool,
    },

    /// Emit `makeX` test-object factories for model classes
    Factories {
        /// Type graph JSON file
        graph: PathBuf,

        #[command(flatten)]
        pass: PassArgs,

        /// Write this pass's schema registry as JSON
        #[arg(long, value_name = "FILE")]
        registry_out: Option<PathBuf>,

        /// Module providing `randomUUID`
        #[arg(long)]
        uuid_module: Option<String>,
    },

    /// Emit test expectations for entities, events and mutations
    Expectations {
        /// Type graph JSON file
        graph: PathBuf,

        #[command(flatten)]
        pass: PassArgs,

        /// Write this pass's schema registry as JSON
        #[arg(long, value_name = "FILE")]
        registry_out: Option<PathBuf>,

        /// Glob over schema locations that marks a class as an entity (repeatable)
        #[arg(long = "entity-glob", value_name = "GLOB")]
        entity_globs: Vec<String>,

        /// Event topic and payload schema, as TOPIC=SCHEMA (repeatable)
        #[arg(long = "event-topic", value_name = "TOPIC=SCHEMA", value_parser = parse_event_topic)]
        event_topics: Vec<EventTopic>,

        /// Module providing `anyOf` and the test fixture types
        #[arg(long)]
        testing_module: Option<String>,

        /// Module providing `expect`
        #[arg(long)]
        matchers_module: Option<String>,
    },

    /// Emit a controller contract from a parsed API specification
    Controllers {
        /// API specification JSON file
        api: PathBuf,

        #[command(flatten)]
        pass: PassArgs,
    },
}

/// Arguments shared by every pass.
#[derive(Args)]
struct PassArgs {
    /// Output TypeScript file; imports and registry entries are relative to it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Registry written by an earlier pass (repeatable)
    #[arg(long = "registry", value_name = "FILE")]
    registries: Vec<PathBuf>,

    /// Render options as JSON (kebab-case keys); flags take precedence
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Comment written at the top of the output file
    #[arg(long)]
    leading_comment: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ProviderArg {
    Validation,
    Transform,
    ApiDocs,
    Coercion,
}

fn parse_event_topic(raw: &str) -> Result<EventTopic, String> {
    match raw.split_once('=') {
        Some((topic, schema)) if !topic.is_empty() && !schema.is_empty() => Ok(EventTopic {
            topic: topic.to_string(),
            schema: schema.to_string(),
        }),
        _ => Err(format!("expected TOPIC=SCHEMA, got '{raw}'")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays free for piping
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Models {
            graph,
            pass,
            registry_out,
            providers,
            coercion_module,
            no_readonly,
            no_assertions,
            no_constructor,
        } => {
            let graph = read_graph(&graph)?;
            let mut options = pass.render_options()?;
            if no_readonly {
                options.readonly_properties = false;
            }
            if no_assertions {
                options.non_null_assertion_on_properties = false;
            }
            if no_constructor {
                options.assign_constructor = false;
            }

            let providers: Vec<Box<dyn DecoratorProvider>> = if providers.is_empty() {
                default_providers()
            } else {
                providers
                    .into_iter()
                    .map(|p| -> Box<dyn DecoratorProvider> {
                        match p {
                            ProviderArg::Validation => Box::new(ValidationProvider),
                            ProviderArg::Transform => Box::new(TransformProvider),
                            ProviderArg::ApiDocs => Box::new(ApiDocumentationProvider),
                            ProviderArg::Coercion => {
                                Box::new(CoercionProvider::new(coercion_module.clone()))
                            }
                        }
                    })
                    .collect()
            };

            let output = Engine::new(&graph, options, ModelClassHooks)
                .with_providers(providers)
                .with_upstreams(pass.upstream_registries()?)
                .render()
                .map_err(|e| anyhow::Error::from(e).context("Model pass failed"))?;
            finish_pass(output, registry_out.as_deref())?;
        }
        Commands::Factories {
            graph,
            pass,
            registry_out,
            uuid_module,
        } => {
            let graph = read_graph(&graph)?;
            let mut factory_options = FactoryOptions::default();
            if let Some(module) = uuid_module {
                factory_options.uuid_module = module;
            }

            let output = Engine::new(
                &graph,
                pass.render_options()?,
                FactoryHooks::new(factory_options),
            )
            .with_upstreams(pass.upstream_registries()?)
            .render()
            .map_err(|e| anyhow::Error::from(e).context("Factory pass failed"))?;
            finish_pass(output, registry_out.as_deref())?;
        }
        Commands::Expectations {
            graph,
            pass,
            registry_out,
            entity_globs,
            event_topics,
            testing_module,
            matchers_module,
        } => {
            let graph = read_graph(&graph)?;
            let mut expectation_options = ExpectationOptions {
                entity_globs,
                event_topics,
                ..ExpectationOptions::default()
            };
            if let Some(module) = testing_module {
                expectation_options.testing_module = module;
            }
            if let Some(module) = matchers_module {
                expectation_options.matchers_module = module;
            }

            let hooks = ExpectationHooks::new(expectation_options)
                .map_err(|e| anyhow::Error::from(e).context("Invalid expectation options"))?;
            let output = Engine::new(&graph, pass.render_options()?, hooks)
                .with_upstreams(pass.upstream_registries()?)
                .render()
                .map_err(|e| anyhow::Error::from(e).context("Expectation pass failed"))?;
            finish_pass(output, registry_out.as_deref())?;
        }
        Commands::Controllers { api, pass } => {
            let api = ApiSpecification::load(&api)?;
            let contract = render_contract(
                &api,
                &pass.render_options()?,
                &pass.upstream_registries()?,
            )
            .context("Controller contract pass failed")?;
            write_source(&contract.file, &contract.source)?;
            info!(interface = %contract.interface_name, "wrote controller contract");
        }
    }

    Ok(())
}

impl PassArgs {
    fn render_options(&self) -> Result<RenderOptions> {
        let mut options = match &self.options {
            Some(path) => read_json::<RenderOptions>(path, "render options")?,
            None => RenderOptions::default(),
        };
        if let Some(output) = &self.output {
            options.output_file = Some(output.clone());
        }
        if let Some(comment) = &self.leading_comment {
            options.leading_comment = Some(comment.clone());
        }
        Ok(options)
    }

    fn upstream_registries(&self) -> Result<Vec<SchemaRegistry>> {
        self.registries
            .iter()
            .map(|path| read_json::<SchemaRegistry>(path, "registry"))
            .collect()
    }
}

fn read_graph(path: &Path) -> Result<TypeGraph> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read type graph: {}", path.display()))?;
    TypeGraph::from_json_str(&content)
        .with_context(|| format!("Failed to load type graph from: {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {what} from: {}", path.display()))
}

fn finish_pass(output: RenderOutput, registry_out: Option<&Path>) -> Result<()> {
    write_source(&output.file, &output.source)?;
    if let Some(path) = registry_out {
        write_json(&output.registry, path)?;
    }
    info!(
        file = %output.file.display(),
        registered = output.registry.len(),
        "wrote pass output"
    );
    Ok(())
}

fn write_source(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir: {}", parent.display()))?;
    }
    fs::write(path, source)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

fn write_json<T: serde::Serialize>(val: &T, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush JSON output")?;

    Ok(())
}

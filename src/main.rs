use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;

use souschef_rs::souschef::config::AppConfig;
use souschef_rs::souschef::llm::{ChatModel, OpenAiChatModel};
use souschef_rs::souschef::places::{DisabledPlaces, GooglePlacesClient, PlacesSearch};
use souschef_rs::souschef::server;
use souschef_rs::souschef::workflow::{RecipeWorkflow, WorkflowParams};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the recipe workflow once from the command line
    Run {
        /// The recipe request
        #[arg(short, long)]
        request: String,

        /// Dietary goal, e.g. "weight loss"
        #[arg(short, long)]
        goal: Option<String>,

        /// Body weight in pounds
        #[arg(short, long)]
        weight: Option<u32>,
    },
    /// Start the chat HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;

    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.model_name.clone(),
    ));

    let places: Arc<dyn PlacesSearch> = match &config.places_api_key {
        Some(key) => Arc::new(GooglePlacesClient::new(
            key.clone(),
            config.places_endpoint.clone(),
        )),
        None => {
            log::warn!("GOOGLE_PLACES_API_KEY not set; restaurant suggestions disabled");
            Arc::new(DisabledPlaces)
        }
    };

    // A build failure here is a wiring defect and must abort startup
    let workflow = Arc::new(RecipeWorkflow::new(model, places, &config)?);

    match args.command {
        Commands::Run {
            request,
            goal,
            weight,
        } => {
            let params = WorkflowParams {
                goal: goal.unwrap_or_else(|| config.default_goal.clone()),
                weight: weight.unwrap_or(config.default_weight),
            };
            let output = workflow.run(&request, &params).await?;
            println!("{}", output);
        }
        Commands::Serve { port } => {
            let default_params = WorkflowParams {
                goal: config.default_goal.clone(),
                weight: config.default_weight,
            };
            server::serve(port, workflow, default_params)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
        }
    }

    Ok(())
}

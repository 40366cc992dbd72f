use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use burn::backend::ndarray::NdArrayDevice;
use clap::Parser;
use log::LevelFilter;
use resnet_imagenet::{ImageClassifier, LoadError};
use simple_logger::SimpleLogger;

mod error;
mod routes;
mod types;

use types::{ModelState, ServeBackend};

/// Image classification service: POST an image to /classify as the
/// multipart field `image`, get back the top ImageNet label and its
/// confidence.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to serve on.
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Load weights from this torch checkpoint instead of downloading.
    #[arg(long)]
    weights: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    if let Err(err) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("logger init failed: {err}");
    }

    // Load once, before accepting requests. A failed load is remembered and
    // answered with HTTP 500 instead of killing the server.
    let state = match load_classifier(&args) {
        Ok(classifier) => {
            log::info!("model ready");
            ModelState::Ready(Arc::new(classifier))
        }
        Err(err) => {
            log::error!("error loading model: {err}");
            ModelState::Unavailable(err.to_string())
        }
    };
    let state = web::Data::new(state);

    log::info!("listening on {}:{}", args.host, args.port);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(routes::classify)
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await
}

fn load_classifier(args: &Args) -> Result<ImageClassifier<ServeBackend>, LoadError> {
    let device = NdArrayDevice::default();
    match &args.weights {
        Some(path) => ImageClassifier::from_weights_file(path, &device),
        None => ImageClassifier::pretrained(&device),
    }
}

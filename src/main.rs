// src/main.rs

mod app_state;
mod config;
mod db;
mod error;
mod models;
mod notifier;
mod store;
mod tasks;

use std::env;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpResponse, HttpServer, Responder};
use env_logger::Env;
use log::error;
use serde_json::json;

use crate::app_state::AppState;
use crate::notifier::Notifier;
use crate::store::TaskStore;
use crate::tasks::{create_task, delete_task, list_tasks, update_task_status};

async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task Tracker API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "error": "Route not found",
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let mongodb = Arc::new(db::MongoDB::init(&config.mongo_uri, &config.database_name).await);
    let store = TaskStore::new(&mongodb.db);
    if let Err(e) = store.ensure_indexes().await {
        error!("Failed to create task indexes: {}", e);
    }
    let notifier = Notifier::new(config.webhook_url.clone());

    let frontend_origin =
        env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let port = config.port;

    println!("Server running at http://0.0.0.0:{}", port);
    println!("Allowed CORS Origin: {}", frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                notifier: notifier.clone(),
            }))
            .route("/", web::get().to(index))
            .service(
                web::scope("/api").service(
                    web::scope("/tasks")
                        .route("", web::post().to(create_task))
                        .route("", web::get().to(list_tasks))
                        .route("/{task_id}/status", web::patch().to(update_task_status))
                        .route("/{task_id}", web::delete().to(delete_task)),
                ),
            )
            .default_service(web::route().to(not_found))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

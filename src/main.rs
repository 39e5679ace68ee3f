use rocket::fairing::AdHoc;
use rocket::{catchers, launch, routes, Build, Rocket};

use config::ServerConfig;
use database::ScoreStore;

mod config;
mod cors;
mod database;
mod requests;

#[launch]
fn rocket() -> _ {
    build_rocket(ServerConfig::from_env())
}

pub fn build_rocket(config: ServerConfig) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("port", config.port));
    let rocket = rocket::custom(figment);

    // The logger is set up by now
    for issue in &config.issues {
        log::error!("Configuration error: {}", issue);
    }

    let store_config = config.store;
    rocket
        .attach(AdHoc::on_ignite("Score Store", move |rocket| async move {
            let store = ScoreStore::connect(&store_config).await;
            rocket.manage(store)
        }))
        .attach(AdHoc::on_shutdown("Score Store", |rocket| {
            Box::pin(async move {
                if let Some(store) = rocket.state::<ScoreStore>() {
                    store.close().await;
                }
            })
        }))
        .attach(cors::Cors)
        .mount(
            "/",
            routes![
                requests::index,
                requests::get_high_score,
                requests::submit_score,
                cors::preflight
            ],
        )
        .register("/", catchers![requests::default_catcher])
}

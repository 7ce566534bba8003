use std::env;

use actix_files::Files;
use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use pushkind_common::db::establish_connection_pool;
use pushkind_common::middleware::RedirectUnauthorized;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{logout, not_assigned};
use tera::Tera;

use pushkind_bulk::repository::DieselRepository;
use pushkind_bulk::routes::api::{
    api_create_inventory, api_create_order, api_delete_inventory, api_delete_order,
    api_get_order, api_item_status, api_list_orders, api_stock, api_update_inventory,
    api_update_order, json_config,
};
use pushkind_bulk::routes::delivery::{
    deliver_items, item_status, order_status, rollover, show_delivery,
};
use pushkind_bulk::routes::finance::{add_expense, delete_expense, edit_expense, show_finance};
use pushkind_bulk::routes::inventory::{
    add_inventory, delete_inventory, edit_inventory, show_inventory, stock_movement,
};
use pushkind_bulk::routes::main::show_index;
use pushkind_bulk::routes::orders::{add_order, delete_order, edit_order};
use pushkind_bulk::routes::paise_filter;
use pushkind_bulk::routes::products::{
    add_product, archive_product, edit_product, restore_product, show_products, upload_products,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let database_url = env::var("DATABASE_URL").unwrap_or("app.db".to_string());
    let port = env::var("PORT").unwrap_or("8080".to_string());
    let port = port.parse::<u16>().unwrap_or(8080);
    let address = env::var("ADDRESS").unwrap_or("127.0.0.1".to_string());

    let secret = env::var("SECRET_KEY");
    let secret_key = match &secret {
        Ok(key) => Key::from(key.as_bytes()),
        Err(_) => Key::generate(),
    };

    let auth_service_url = env::var("AUTH_SERVICE_URL");
    let auth_service_url = match auth_service_url {
        Ok(auth_service_url) => auth_service_url,
        Err(_) => {
            log::error!("AUTH_SERVICE_URL environment variable not set");
            std::process::exit(1);
        }
    };

    let common_config = CommonServerConfig {
        secret: secret.unwrap_or_default(),
        auth_service_url,
    };

    let domain = env::var("DOMAIN").unwrap_or("localhost".to_string());

    let pool = match establish_connection_pool(&database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let mut tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            log::error!("Parsing error(s): {e}");
            std::process::exit(1);
        }
    };
    tera.register_filter("paise", paise_filter);

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(Some(format!(".{domain}")))
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(not_assigned)
            .service(
                web::scope("/api/v1")
                    .app_data(json_config())
                    .service(api_list_orders)
                    .service(api_get_order)
                    .service(api_create_order)
                    .service(api_update_order)
                    .service(api_delete_order)
                    .service(api_item_status)
                    .service(api_create_inventory)
                    .service(api_update_inventory)
                    .service(api_delete_inventory)
                    .service(api_stock),
            )
            .service(
                web::scope("")
                    .wrap(RedirectUnauthorized)
                    .service(show_index)
                    .service(add_order)
                    .service(edit_order)
                    .service(delete_order)
                    .service(show_products)
                    .service(add_product)
                    .service(upload_products)
                    .service(edit_product)
                    .service(archive_product)
                    .service(restore_product)
                    .service(show_inventory)
                    .service(add_inventory)
                    .service(edit_inventory)
                    .service(delete_inventory)
                    .service(stock_movement)
                    .service(show_finance)
                    .service(add_expense)
                    .service(edit_expense)
                    .service(delete_expense)
                    .service(show_delivery)
                    .service(item_status)
                    .service(order_status)
                    .service(deliver_items)
                    .service(rollover)
                    .service(logout),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(common_config.clone()))
    })
    .bind((address, port))?
    .run()
    .await
}

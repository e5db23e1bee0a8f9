#[actix_web::main]
async fn main() -> std::io::Result<()> {
    ficha_server::run().await
}

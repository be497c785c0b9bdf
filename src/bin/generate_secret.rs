use argon2::password_hash::rand_core::{OsRng, RngCore};

const SECRET_BYTES: usize = 32;

fn main() {
    let mut secret = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut secret);
    let secret = hex::encode(secret);

    println!("Generated signing secret:");
    println!("{secret}");
    println!();
    println!("Export it before starting the server, for example:");
    println!("JWT_SECRET_KEY=\"{secret}\"");
}

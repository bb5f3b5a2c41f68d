pub mod win_rs;

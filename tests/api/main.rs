mod health_check;
mod users;

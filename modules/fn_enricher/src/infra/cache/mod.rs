pub mod redis;

pub use self::redis::RedisUserCache;

pub mod rag_chat_service;

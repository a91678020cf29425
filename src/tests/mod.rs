mod testcases;
